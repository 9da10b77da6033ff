//! `multipart/form-data` framing for a single file part.
//!
//! The body is never assembled in memory. The request head, preamble and
//! trailer are small fixed-capacity strings; the file streams between the
//! preamble and the trailer, so `Content-Length` is computed from the file
//! size alone.

use core::fmt::Write as _;

use heapless::String;

use super::url::UploadTarget;

/// Part boundary. Fixed so that request bytes are reproducible.
pub const BOUNDARY: &str = "----VoiceMemoBoundary7MA4YWxk";

/// Form field the server reads the recording from.
pub const FIELD_NAME: &str = "file";

/// Content type of the file part.
pub const PART_CONTENT_TYPE: &str = "audio/wav";

/// Capacity of the part preamble.
pub const MAX_PREAMBLE_LEN: usize = 256;

/// Capacity of the closing delimiter.
pub const MAX_TRAILER_LEN: usize = 64;

/// Capacity of the request line plus headers.
pub const MAX_HEAD_LEN: usize = 512;

/// Framing did not fit its fixed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramingOverflow;

/// Last component of a `/`-separated path.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Preamble and trailer around one file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFraming {
    preamble: String<MAX_PREAMBLE_LEN>,
    trailer: String<MAX_TRAILER_LEN>,
}

impl MultipartFraming {
    /// Framing for a part carrying `filename`.
    pub fn new(filename: &str) -> Result<Self, FramingOverflow> {
        let mut preamble = String::new();
        write!(
            preamble,
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{FIELD_NAME}\"; filename=\"{filename}\"\r\n\
             Content-Type: {PART_CONTENT_TYPE}\r\n\
             \r\n"
        )
        .map_err(|_| FramingOverflow)?;
        let mut trailer = String::new();
        write!(trailer, "\r\n--{BOUNDARY}--\r\n").map_err(|_| FramingOverflow)?;
        Ok(Self { preamble, trailer })
    }

    /// Bytes sent before the file.
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Bytes sent after the file: `\r\n--{BOUNDARY}--\r\n`.
    pub fn trailer(&self) -> &str {
        &self.trailer
    }

    /// Exact body length for a file of `file_size` bytes.
    pub fn content_length(&self, file_size: u64) -> u64 {
        (self.preamble.len() as u64)
            .saturating_add(file_size)
            .saturating_add(self.trailer().len() as u64)
    }
}

/// Request line and headers for a POST of `content_length` body bytes.
pub fn request_head(
    target: &UploadTarget,
    content_length: u64,
) -> Result<String<MAX_HEAD_LEN>, FramingOverflow> {
    let mut head = String::new();
    write!(
        head,
        "POST {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Connection: close\r\n\
         Content-Type: multipart/form-data; boundary={BOUNDARY}\r\n\
         Content-Length: {content_length}\r\n\
         \r\n",
        path = target.path,
        host = target.host,
    )
    .map_err(|_| FramingOverflow)?;
    Ok(head)
}
