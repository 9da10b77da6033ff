//! Local filesystem Storage implementation for host builds.
//!
//! `LocalFileStorage` implements `platform::Storage` using `std::fs`.
//! Used when the `std` feature is enabled (xtask and integration tests).
//! All paths are resolved relative to the root provided at construction.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror_no_std::Error;

use crate::storage::{File, OpenMode, Storage};
use crate::storage_config::MountConfig;

/// I/O failure under the storage root.
#[derive(Debug, Error)]
#[error("local storage error: {0}")]
pub struct LocalStorageError(pub std::io::Error);

/// An open file on the local filesystem.
pub struct LocalFile {
    inner: fs::File,
}

impl File for LocalFile {
    type Error = LocalStorageError;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        Read::read(&mut self.inner, buf).map_err(LocalStorageError)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Write::write(&mut self.inner, buf).map_err(LocalStorageError)
    }

    async fn seek(&mut self, pos: u64) -> Result<u64, Self::Error> {
        Seek::seek(&mut self.inner, SeekFrom::Start(pos)).map_err(LocalStorageError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.inner).map_err(LocalStorageError)
    }

    async fn close(mut self) -> Result<(), Self::Error> {
        Write::flush(&mut self.inner).map_err(LocalStorageError)?;
        self.inner.sync_all().map_err(LocalStorageError)
    }

    fn size(&self) -> u64 {
        self.inner.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

/// A `platform::Storage` implementation backed by `std::fs`.
///
/// # Example
/// ```no_run
/// # async fn example() {
/// use platform::storage_local::LocalFileStorage;
/// use platform::{OpenMode, Storage, MOUNT_SEQUENCE};
/// let mut storage = LocalFileStorage::new("/tmp/memos");
/// storage.mount(MOUNT_SEQUENCE[0]).await.unwrap();
/// let file = storage.open("voice_0001.wav", OpenMode::Read).await.unwrap();
/// # }
/// ```
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a new storage rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create from the `MEMO_PATH` environment variable.
    ///
    /// Returns `None` if `MEMO_PATH` is not set or is not valid UTF-8.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("MEMO_PATH").ok().map(Self::new)
    }

    /// Directory every relative path is resolved against.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for LocalFileStorage {
    type Error = LocalStorageError;
    type File = LocalFile;

    /// The bus configuration has no meaning on a host filesystem; mounting
    /// only makes sure the root directory exists.
    async fn mount(&mut self, _config: MountConfig) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.root).map_err(LocalStorageError)
    }

    async fn exists(&mut self, path: &str) -> Result<bool, Self::Error> {
        Ok(self.resolve(path).exists())
    }

    async fn remove(&mut self, path: &str) -> Result<(), Self::Error> {
        fs::remove_file(self.resolve(path)).map_err(LocalStorageError)
    }

    async fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, Self::Error> {
        let full = self.resolve(path);
        let inner = match mode {
            OpenMode::Read => fs::File::open(&full),
            OpenMode::WriteTruncate => fs::OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(&full),
        }
        .map_err(LocalStorageError)?;
        Ok(LocalFile { inner })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::storage_config::MOUNT_SEQUENCE;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn mount_creates_missing_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("card");
        let mut storage = LocalFileStorage::new(&root);
        storage.mount(MOUNT_SEQUENCE[0]).await.unwrap();
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let tmp = TempDir::new().unwrap();
        let mut storage = LocalFileStorage::new(tmp.path());
        let mut file = storage.open("memo.bin", OpenMode::WriteTruncate).await.unwrap();
        assert_eq!(file.write(b"hello world").await.unwrap(), 11);
        file.close().await.unwrap();

        let mut file = storage.open("memo.bin", OpenMode::Read).await.unwrap();
        let mut buf = [0u8; 11];
        let n = file.read(&mut buf).await.unwrap();
        assert_eq!(n, 11);
        assert_eq!(&buf, b"hello world");
    }

    #[tokio::test]
    async fn seek_and_overwrite_keeps_length() {
        let tmp = TempDir::new().unwrap();
        let mut storage = LocalFileStorage::new(tmp.path());
        let mut file = storage.open("seek.bin", OpenMode::WriteTruncate).await.unwrap();
        file.write(b"ABCDEFGH").await.unwrap();
        file.seek(0).await.unwrap();
        file.write(b"xy").await.unwrap();
        file.close().await.unwrap();
        assert_eq!(fs::read(tmp.path().join("seek.bin")).unwrap(), b"xyCDEFGH");
    }

    #[tokio::test]
    async fn size_tracks_writes() {
        let tmp = TempDir::new().unwrap();
        let mut storage = LocalFileStorage::new(tmp.path());
        let mut file = storage.open("size.bin", OpenMode::WriteTruncate).await.unwrap();
        file.write(&[0u8; 64]).await.unwrap();
        file.flush().await.unwrap();
        assert_eq!(file.size(), 64);
    }

    #[tokio::test]
    async fn truncate_discards_previous_contents() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("old.bin"), b"previous").unwrap();
        let mut storage = LocalFileStorage::new(tmp.path());
        let file = storage.open("old.bin", OpenMode::WriteTruncate).await.unwrap();
        assert_eq!(file.size(), 0);
    }

    #[tokio::test]
    async fn remove_and_exists() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("gone.bin"), b"x").unwrap();
        let mut storage = LocalFileStorage::new(tmp.path());
        assert!(storage.exists("gone.bin").await.unwrap());
        storage.remove("gone.bin").await.unwrap();
        assert!(!storage.exists("gone.bin").await.unwrap());
    }

    #[tokio::test]
    async fn leading_slash_is_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("voice_0001.wav"), b"x").unwrap();
        let mut storage = LocalFileStorage::new(tmp.path());
        assert!(storage.exists("/voice_0001.wav").await.unwrap());
    }

    #[tokio::test]
    async fn open_missing_for_read_fails() {
        let tmp = TempDir::new().unwrap();
        let mut storage = LocalFileStorage::new(tmp.path());
        assert!(storage.open("missing.bin", OpenMode::Read).await.is_err());
    }
}
