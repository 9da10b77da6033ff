//! Voice memo recorder core
//!
//! Records microphone audio into sequentially numbered WAV files on a
//! removable card and uploads finished recordings over HTTP.
//!
//! # Components
//!
//! - [`StorageMounter`] - brings the card up, falling back through
//!   [`platform::MOUNT_SEQUENCE`]
//! - [`WavWriter`] - streaming WAV writer with a rewrite-on-close header
//! - [`Recorder`] - the Idle/Recording/Stopped session state machine
//! - [`UploadTransport`] - chunked `multipart/form-data` POST
//! - [`Status`] - the single status value shown to the user
//!
//! All hardware is reached through the `platform` traits, so the same code
//! runs on the device and against the host implementations in tests.
//!
//! # Example
//!
//! ```no_run
//! use platform::{AudioCapture, Network, Storage};
//! use voice::{Recorder, UploadTransport, VoiceConfig};
//!
//! async fn memo<S: Storage, C: AudioCapture, N: Network>(
//!     card: S,
//!     codec: C,
//!     net: N,
//! ) -> Option<()> {
//!     let config = VoiceConfig::new("http://192.168.1.119:8000/upload")?;
//!     let mut recorder = Recorder::setup(card, Some(codec), &config).await;
//!     recorder.start_recording().await.ok()?;
//!     for _ in 0..100 {
//!         recorder.tick().await;
//!     }
//!     recorder.stop_recording().await?;
//!     let mut transport = UploadTransport::from_config(net, &config);
//!     recorder.upload_recording(&mut transport).await.ok()?;
//!     Some(())
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod config;
pub mod mounter;
pub mod recorder;
pub mod status;
pub mod upload;
pub mod wav;

pub use config::{VoiceConfig, AUDIO_BUFFER_SIZE, UPLOAD_CHUNK_SIZE};
pub use mounter::{MountError, MountedStorage, StorageMounter};
pub use recorder::{Recorder, RecorderState, RecordingSummary, StartError};
pub use status::Status;
pub use upload::{UploadError, UploadReceipt, UploadTarget, UploadTransport, UrlError};
pub use wav::{WavFormat, WavHeader, WavWriter, WAV_HEADER_SIZE};
