//! Chunked multipart upload of a finished recording.
//!
//! One attempt per call, no retries:
//!
//! ```text
//! preconditions → parse URL → open file → size check → connect
//!   → head → preamble → file in UPLOAD_CHUNK_SIZE chunks → trailer
//!   → status line → close connection → close file
//! ```
//!
//! Every failed precondition returns before the network is touched. Once the
//! file or the connection is open it is closed on every exit path.

use embedded_io_async::Write as _;
use heapless::String;
use platform::{Connection, File, Network, OpenMode, Storage};
use thiserror_no_std::Error;

use super::multipart::{basename, request_head, MultipartFraming};
use super::response::{printable, read_status_line, StatusLine};
use super::url::{UploadTarget, UrlError};
use crate::config::{VoiceConfig, MAX_URL_LEN, UPLOAD_CHUNK_SIZE};
use crate::status::Status;
use crate::wav::WAV_HEADER_SIZE;

/// Everything an upload needs from the recorder, borrowed for one attempt.
pub struct UploadRequest<'a, S> {
    /// A recording session is active.
    pub recording: bool,
    /// Mounted storage, if bring-up succeeded.
    pub storage: Option<&'a mut S>,
    /// Last finished recording, if any.
    pub file: Option<&'a str>,
}

/// Outcome of an accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UploadReceipt {
    /// Size of the uploaded file, header included.
    pub file_bytes: u64,
    /// Declared and sent body length.
    pub content_length: u64,
    /// Status code from the server (200 or 201).
    pub http_status: u16,
}

/// Why an upload did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadError {
    /// A recording is in progress.
    #[error("stop recording before uploading")]
    Recording,
    /// Storage was never mounted.
    #[error("storage not mounted")]
    StorageNotReady,
    /// No recording has been saved yet.
    #[error("no recording to upload")]
    NoFile,
    /// The network reports no connectivity.
    #[error("network not connected")]
    NoNetwork,
    /// The configured URL is malformed.
    #[error("bad upload URL: {0}")]
    BadUrl(UrlError),
    /// The recording could not be opened.
    #[error("cannot open recording")]
    FileOpen,
    /// The recording holds no audio.
    #[error("recording is empty ({size} bytes)")]
    EmptyFile {
        /// File size in bytes.
        size: u64,
    },
    /// Request head or preamble did not fit its buffer.
    #[error("request framing overflow")]
    Framing,
    /// TCP connect failed.
    #[error("connect failed")]
    Connect,
    /// Reading the recording failed mid-stream.
    #[error("recording read failed")]
    FileRead,
    /// Writing to the connection failed.
    #[error("send failed")]
    Send,
    /// The file yielded fewer bytes than its size.
    #[error("recording truncated: sent {sent} of {expected} bytes")]
    Truncated {
        /// Bytes actually streamed.
        sent: u64,
        /// Size reported when the file was opened.
        expected: u64,
    },
    /// No status line came back.
    #[error("no response from server")]
    NoResponse,
    /// The status line was malformed or not 200/201.
    #[error("server rejected upload")]
    Rejected {
        /// Status code, when the line parsed.
        code: Option<u16>,
    },
}

impl UploadError {
    /// Status reported for this failure.
    pub const fn status(&self) -> Status {
        match self {
            Self::Recording => Status::StopFirst,
            Self::StorageNotReady => Status::SdNotReady,
            Self::NoFile => Status::NoFile,
            Self::NoNetwork => Status::NoWifi,
            Self::BadUrl(_) => Status::BadUrl,
            Self::FileOpen => Status::FileError,
            Self::EmptyFile { .. } => Status::EmptyFile,
            Self::Connect => Status::ConnectFail,
            Self::Framing
            | Self::FileRead
            | Self::Send
            | Self::Truncated { .. }
            | Self::NoResponse
            | Self::Rejected { .. } => Status::UploadFail,
        }
    }
}

/// HTTP uploader bound to one network stack and one endpoint.
pub struct UploadTransport<N: Network> {
    network: N,
    url: String<MAX_URL_LEN>,
}

impl<N: Network> UploadTransport<N> {
    /// Uploader posting to `url`. The URL is validated per attempt.
    pub fn new(network: N, url: String<MAX_URL_LEN>) -> Self {
        Self { network, url }
    }

    /// Uploader posting to the configured endpoint.
    pub fn from_config(network: N, config: &VoiceConfig) -> Self {
        Self::new(network, config.upload_url.clone())
    }

    /// Configured endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Upload the requested recording.
    pub async fn upload<S: Storage>(
        &mut self,
        request: UploadRequest<'_, S>,
    ) -> Result<UploadReceipt, UploadError> {
        if request.recording {
            return Err(UploadError::Recording);
        }
        let storage = request.storage.ok_or(UploadError::StorageNotReady)?;
        let path = request.file.ok_or(UploadError::NoFile)?;
        if !self.network.is_connected() {
            return Err(UploadError::NoNetwork);
        }
        let target = UploadTarget::parse(&self.url).map_err(UploadError::BadUrl)?;

        let mut file = storage
            .open(path, OpenMode::Read)
            .await
            .map_err(|_| UploadError::FileOpen)?;
        let size = file.size();
        let outcome = if size <= WAV_HEADER_SIZE as u64 {
            Err(UploadError::EmptyFile { size })
        } else {
            self.post(&target, path, &mut file, size).await
        };
        let _ = file.close().await;
        outcome
    }

    async fn post<F: File>(
        &mut self,
        target: &UploadTarget,
        path: &str,
        file: &mut F,
        size: u64,
    ) -> Result<UploadReceipt, UploadError> {
        let framing = MultipartFraming::new(basename(path)).map_err(|_| UploadError::Framing)?;
        let content_length = framing.content_length(size);
        let head = request_head(target, content_length).map_err(|_| UploadError::Framing)?;

        tracing::info!(
            "upload: {} ({} bytes) to {}:{}{}",
            path,
            size,
            target.host.as_str(),
            target.port,
            target.path.as_str()
        );
        let mut conn = self
            .network
            .connect(&target.host, target.port)
            .await
            .map_err(|_| UploadError::Connect)?;

        let exchanged = exchange(&mut conn, file, &framing, &head, size).await;
        conn.close().await;

        let http_status = exchanged?;
        Ok(UploadReceipt {
            file_bytes: size,
            content_length,
            http_status,
        })
    }
}

async fn exchange<C: Connection, F: File>(
    conn: &mut C,
    file: &mut F,
    framing: &MultipartFraming,
    head: &str,
    size: u64,
) -> Result<u16, UploadError> {
    send(conn, head.as_bytes()).await?;
    send(conn, framing.preamble().as_bytes()).await?;
    stream_file(conn, file, size).await?;
    send(conn, framing.trailer().as_bytes()).await?;
    conn.flush().await.map_err(|_| UploadError::Send)?;

    let line = read_status_line(conn)
        .await
        .map_err(|_| UploadError::NoResponse)?;
    if line.is_empty() {
        return Err(UploadError::NoResponse);
    }
    match StatusLine::parse(&line) {
        Some(status) if status.is_accepted() => {
            tracing::info!("upload: server answered {}", status.code);
            Ok(status.code)
        }
        parsed => {
            tracing::warn!("upload: rejected by server: {}", printable(&line));
            Err(UploadError::Rejected {
                code: parsed.map(|status| status.code),
            })
        }
    }
}

async fn send<C: Connection>(conn: &mut C, bytes: &[u8]) -> Result<(), UploadError> {
    conn.write_all(bytes).await.map_err(|_| UploadError::Send)
}

#[allow(clippy::large_stack_arrays)] // one transfer buffer for the whole upload
async fn stream_file<C: Connection, F: File>(
    conn: &mut C,
    file: &mut F,
    size: u64,
) -> Result<(), UploadError> {
    let mut chunk = [0u8; UPLOAD_CHUNK_SIZE];
    let mut sent: u64 = 0;
    while sent < size {
        let want = usize::try_from(size.saturating_sub(sent))
            .unwrap_or(UPLOAD_CHUNK_SIZE)
            .min(UPLOAD_CHUNK_SIZE);
        let buf = chunk.get_mut(..want).unwrap_or(&mut []);
        let n = file.read(buf).await.map_err(|_| UploadError::FileRead)?;
        if n == 0 {
            break;
        }
        send(conn, buf.get(..n).unwrap_or(&[])).await?;
        sent = sent.saturating_add(n as u64);
        tracing::trace!("upload: {}/{} bytes", sent, size);
        embassy_futures::yield_now().await;
    }
    if sent < size {
        return Err(UploadError::Truncated {
            sent,
            expected: size,
        });
    }
    Ok(())
}
