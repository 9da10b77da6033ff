//! Storage trait contract, checked against every host implementation.
//!
//! The recorder relies on these behaviours: truncate-on-open, in-place
//! rewrite after seek, size reflecting written bytes, and leading-slash
//! paths resolving to the card root.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use platform::mocks::MockStorage;
use platform::storage_local::LocalFileStorage;
use platform::{File, OpenMode, Storage, MOUNT_SEQUENCE};
use tempfile::TempDir;

async fn contract<S: Storage>(storage: &mut S) {
    storage.mount(MOUNT_SEQUENCE[0]).await.unwrap();

    // Create, write, rewrite the head in place.
    let mut file = storage.open("/memo.wav", OpenMode::WriteTruncate).await.unwrap();
    assert_eq!(file.write(&[0u8; 8]).await.unwrap(), 8);
    assert_eq!(file.write(b"payload").await.unwrap(), 7);
    file.seek(0).await.unwrap();
    file.write(b"HEADER!!").await.unwrap();
    file.flush().await.unwrap();
    assert_eq!(file.size(), 15);
    file.close().await.unwrap();

    assert!(storage.exists("memo.wav").await.unwrap());

    // Read back through the other path spelling.
    let mut file = storage.open("memo.wav", OpenMode::Read).await.unwrap();
    assert_eq!(file.size(), 15);
    let mut buf = [0u8; 32];
    let mut got = 0;
    loop {
        let n = file.read(&mut buf[got..]).await.unwrap();
        if n == 0 {
            break;
        }
        got += n;
    }
    assert_eq!(&buf[..got], b"HEADER!!payload");
    file.close().await.unwrap();

    // Reopening for write truncates.
    let file = storage.open("/memo.wav", OpenMode::WriteTruncate).await.unwrap();
    assert_eq!(file.size(), 0);
    file.close().await.unwrap();

    storage.remove("/memo.wav").await.unwrap();
    assert!(!storage.exists("/memo.wav").await.unwrap());
    assert!(storage.open("/memo.wav", OpenMode::Read).await.is_err());
}

#[tokio::test]
async fn mock_storage_honours_contract() {
    let mut card = MockStorage::new();
    contract(&mut card).await;
    assert_eq!(card.open_handles(), 0);
}

#[tokio::test]
async fn local_storage_honours_contract() {
    let tmp = TempDir::new().unwrap();
    let mut storage = LocalFileStorage::new(tmp.path().join("card"));
    contract(&mut storage).await;
    assert!(tmp.path().join("card").is_dir());
}
