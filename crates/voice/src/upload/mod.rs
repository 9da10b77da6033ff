//! HTTP upload of finished recordings.
//!
//! - [`url`] - endpoint parsing
//! - [`multipart`] - request head and part framing
//! - [`response`] - status line reading
//! - [`transport`] - the upload exchange itself

pub mod multipart;
pub mod response;
pub mod transport;
pub mod url;

pub use transport::{UploadError, UploadReceipt, UploadRequest, UploadTransport};
pub use url::{UploadTarget, UrlError};
