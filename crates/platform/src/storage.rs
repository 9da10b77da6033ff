//! Storage abstraction for the removable memo card

use crate::storage_config::MountConfig;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    /// Read-only, positioned at offset 0.
    Read,
    /// Write-only; the file is created if missing and truncated if present.
    WriteTruncate,
}

/// Storage trait for file system access
pub trait Storage {
    /// Error type
    type Error: core::fmt::Debug;
    /// File type
    type File: File<Error = Self::Error>;

    /// Bring the volume online using one bus configuration.
    ///
    /// A failed attempt must leave the driver ready for another attempt
    /// with a different configuration.
    fn mount(
        &mut self,
        config: MountConfig,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Check if path exists
    fn exists(
        &mut self,
        path: &str,
    ) -> impl core::future::Future<Output = Result<bool, Self::Error>>;

    /// Delete the file at `path`.
    fn remove(&mut self, path: &str)
        -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Open file
    fn open(
        &mut self,
        path: &str,
        mode: OpenMode,
    ) -> impl core::future::Future<Output = Result<Self::File, Self::Error>>;
}

/// An open file handle
pub trait File {
    /// Error type
    type Error: core::fmt::Debug;

    /// Read from current position
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>>;

    /// Write at current position, returning the number of bytes accepted.
    fn write(
        &mut self,
        buf: &[u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>>;

    /// Seek to absolute position
    fn seek(&mut self, pos: u64) -> impl core::future::Future<Output = Result<u64, Self::Error>>;

    /// Push buffered writes to the medium.
    fn flush(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Flush and release the handle.
    fn close(self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Get file size
    fn size(&self) -> u64;
}
