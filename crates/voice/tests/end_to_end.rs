//! End-to-end tests: Recorder → disk → UploadTransport → loopback HTTP stub.
//!
//! No mocks for storage or network. Uses tempfiles and a real TCP listener on
//! a std thread, with `LocalFileStorage` standing in for the SD card and
//! `StdNetwork` for the Wi-Fi stack. Only the codec is scripted.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use platform::mocks::MockCapture;
use platform::network_std::StdNetwork;
use platform::storage_local::LocalFileStorage;
use platform::MOUNT_SEQUENCE;
use tempfile::TempDir;
use voice::{Recorder, RecorderState, Status, UploadTransport, VoiceConfig, WavHeader};

/// Accept one request, read it in full, answer with `response`.
fn stub_server(response: &'static [u8]) -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut sock, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 2048];
        loop {
            let n = sock.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if expected_len(&request).is_some_and(|total| request.len() >= total) {
                break;
            }
        }
        sock.write_all(response).unwrap();
        request
    });
    (port, handle)
}

/// Head length plus declared Content-Length, once the head is complete.
fn expected_len(request: &[u8]) -> Option<usize> {
    let head_end = request.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
    let head = std::str::from_utf8(&request[..head_end]).ok()?;
    let body_len: usize = head
        .lines()
        .find_map(|l| l.strip_prefix("Content-Length: "))?
        .trim()
        .parse()
        .ok()?;
    Some(head_end + body_len)
}

#[tokio::test]
async fn record_three_ticks_and_upload() {
    let tmp = TempDir::new().unwrap();
    let (port, server) = stub_server(b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");
    let config = VoiceConfig::new(&format!("http://127.0.0.1:{port}/upload")).unwrap();
    let codec = MockCapture::new();

    let mut rec = Recorder::setup(LocalFileStorage::new(tmp.path()), Some(codec.clone()), &config).await;
    assert_eq!(rec.status(), Status::Ready);
    assert_eq!(rec.mount_config(), Some(MOUNT_SEQUENCE[0]));

    rec.start_recording().await.unwrap();
    for fill in [0x11u8, 0x22, 0x33] {
        codec.queue_chunk(&[fill; 512]);
        assert_eq!(rec.tick().await, 512);
    }
    let summary = rec.stop_recording().await.unwrap();
    assert_eq!(rec.state(), RecorderState::Stopped);
    assert_eq!(summary.path.as_str(), "/voice_0001.wav");

    let on_disk = std::fs::read(tmp.path().join("voice_0001.wav")).unwrap();
    assert_eq!(on_disk.len(), 1580);
    let header = WavHeader::parse(&on_disk).unwrap();
    assert_eq!(header.data_len, 1536);
    assert_eq!(header.riff_chunk_size(), 1572);
    assert_eq!(header.format.sample_rate, 16_000);
    assert_eq!(header.format.channels, 2);

    let mut transport = UploadTransport::from_config(StdNetwork::new(), &config);
    let receipt = rec.upload_recording(&mut transport).await.unwrap();
    assert_eq!(rec.status(), Status::Uploaded);
    assert_eq!(rec.status().as_str(), "Uploaded");
    assert_eq!(receipt.http_status, 201);

    let request = server.join().unwrap();
    let body_start = request.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    assert_eq!(request.len() - body_start, receipt.content_length as usize);
    assert!(request
        .windows(on_disk.len())
        .any(|w| w == on_disk.as_slice()));
}

#[tokio::test]
async fn server_error_is_reported_as_upload_fail() {
    let tmp = TempDir::new().unwrap();
    let (port, server) = stub_server(b"HTTP/1.1 500 Internal Server Error\r\n\r\n");
    let config = VoiceConfig::new(&format!("http://127.0.0.1:{port}/upload")).unwrap();
    let codec = MockCapture::new();

    let mut rec = Recorder::setup(LocalFileStorage::new(tmp.path()), Some(codec.clone()), &config).await;
    rec.start_recording().await.unwrap();
    codec.queue_chunk(&[1u8; 256]);
    rec.tick().await;
    rec.stop_recording().await.unwrap();

    let mut transport = UploadTransport::from_config(StdNetwork::new(), &config);
    assert!(rec.upload_recording(&mut transport).await.is_err());
    assert_eq!(rec.status(), Status::UploadFail);
    server.join().unwrap();
}

#[tokio::test]
async fn refused_connection_is_reported_as_connect_fail() {
    // Bind then drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let tmp = TempDir::new().unwrap();
    let config = VoiceConfig::new(&format!("http://127.0.0.1:{port}/upload")).unwrap();
    let codec = MockCapture::new();

    let mut rec = Recorder::setup(LocalFileStorage::new(tmp.path()), Some(codec.clone()), &config).await;
    rec.start_recording().await.unwrap();
    codec.queue_chunk(&[1u8; 256]);
    rec.tick().await;
    rec.stop_recording().await.unwrap();

    let mut transport = UploadTransport::from_config(StdNetwork::new(), &config);
    assert!(rec.upload_recording(&mut transport).await.is_err());
    assert_eq!(rec.status(), Status::ConnectFail);
}

#[tokio::test]
async fn unmountable_card_refuses_to_record() {
    // A regular file where the root directory should be makes every mount fail.
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("card");
    std::fs::write(&root, b"not a directory").unwrap();

    let config = VoiceConfig::new("http://127.0.0.1:8000/upload").unwrap();
    let codec = MockCapture::new();
    let mut rec = Recorder::setup(LocalFileStorage::new(&root), Some(codec.clone()), &config).await;
    assert_eq!(rec.status(), Status::SdFailed);

    assert!(rec.start_recording().await.is_err());
    assert_eq!(rec.status().as_str(), "SD Not Ready");
    assert_eq!(codec.start_count(), 0);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}
