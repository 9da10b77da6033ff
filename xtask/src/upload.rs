//! xtask upload: send a recording from a host directory to an endpoint.
//!
//! Goes through the same `UploadTransport` the device uses, with
//! `StdNetwork` in place of the Wi-Fi stack.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use platform::network_std::StdNetwork;
use voice::config::MAX_URL_LEN;
use voice::upload::UploadRequest;
use voice::{StorageMounter, UploadReceipt, UploadTransport, WavHeader, WAV_HEADER_SIZE};

use crate::record::{memo_storage, runtime};

pub fn run(url: &str, dir: Option<PathBuf>, file: &str) -> Result<()> {
    let storage = memo_storage(dir)?;
    let local = storage.root().join(file.trim_start_matches('/'));

    println!();
    println!("{}", format!("📤 Uploading {}", local.display()).cyan().bold());
    describe(&local)?;

    let url = heapless::String::try_from(url)
        .map_err(|_| anyhow!("URL longer than {MAX_URL_LEN} bytes"))?;
    let mut transport = UploadTransport::new(StdNetwork::new(), url);

    let start = Instant::now();
    let receipt = runtime()?.block_on(async {
        let mut card = StorageMounter::new()
            .mount(storage)
            .await
            .map_err(|e| anyhow!("{e}"))?;
        let request = UploadRequest {
            recording: false,
            storage: Some(card.storage()),
            file: Some(file),
        };
        transport
            .upload(request)
            .await
            .map_err(|e| anyhow!("{e} ({})", e.status()))
    })?;

    report(&receipt, transport.url(), start);
    Ok(())
}

/// Print the header of `path`, warning if it is not a finished recording.
fn describe(path: &Path) -> Result<()> {
    let mut head = Vec::with_capacity(WAV_HEADER_SIZE);
    std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .take(WAV_HEADER_SIZE as u64)
        .read_to_end(&mut head)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match WavHeader::parse(&head) {
        Ok(header) => println!(
            "  {} Hz, {} ch, {}-bit, {} PCM bytes",
            header.format.sample_rate,
            header.format.channels,
            header.format.bits_per_sample,
            header.data_len
        ),
        Err(e) => eprintln!("{}", format!("  ⚠ Not a finished recording: {e}").yellow()),
    }
    Ok(())
}

fn report(receipt: &UploadReceipt, url: &str, start: Instant) {
    println!(
        "{}",
        format!(
            "  ✓ HTTP {} from {url}: {} bytes sent ({} file) in {:.2}s",
            receipt.http_status,
            receipt.content_length,
            receipt.file_bytes,
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use tempfile::TempDir;

    #[test]
    fn uploads_a_recorded_file() {
        let tmp = TempDir::new().unwrap();
        crate::record::run(Some(tmp.path().to_path_buf()), 0.25, 2, 440.0).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            // The trailer ends the body.
            while !received.ends_with(b"--\r\n") {
                let n = sock.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            sock.write_all(b"HTTP/1.1 200 OK\r\n\r\n").unwrap();
            received
        });

        let url = format!("http://127.0.0.1:{port}/upload");
        run(&url, Some(tmp.path().to_path_buf()), "voice_0001.wav").unwrap();

        let received = server.join().unwrap();
        assert!(received.starts_with(b"POST /upload HTTP/1.1\r\n"));
    }

    #[test]
    fn missing_file_fails_before_connecting() {
        let tmp = TempDir::new().unwrap();
        let err = run(
            "http://127.0.0.1:9/upload",
            Some(tmp.path().to_path_buf()),
            "voice_0042.wav",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
