//! Hardware Abstraction Layer (HAL) for the voice memo gadget
//!
//! This crate provides trait-based abstractions for the peripherals the memo
//! recorder talks to, enabling development and testing without physical
//! hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (board bring-up, xtask host runner)
//!         ↓
//! Feature Layer (voice: recorder, WAV writer, uploader)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (codec driver, SD/SPI driver, Wi-Fi stack)
//! ```
//!
//! # Abstractions
//!
//! - [`AudioCapture`] - Microphone codec capture
//! - [`Storage`] / [`File`] - Removable card file system access
//! - [`Network`] / [`Connection`] - Outbound TCP
//! - [`storage_config`] - Ordered SD bring-up configurations
//!
//! # Features
//!
//! - `std`: Host implementations ([`storage_local`], [`network_std`]) and [`mocks`]
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{Storage, MOUNT_SEQUENCE};
//!
//! async fn bring_up<S: Storage>(card: &mut S) -> bool {
//!     card.mount(MOUNT_SEQUENCE[0]).await.is_ok()
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod audio;
pub mod network;
pub mod storage;
pub mod storage_config;

#[cfg(any(test, feature = "std"))]
pub mod mocks;
#[cfg(any(test, feature = "std"))]
pub mod network_std;
#[cfg(any(test, feature = "std"))]
pub mod storage_local;

// Re-export main high-level traits
pub use audio::{AudioCapture, AudioConfig};
pub use network::{Connection, Network};
pub use storage::{File, OpenMode, Storage};
pub use storage_config::{BusMode, MountConfig, MOUNT_SEQUENCE};
