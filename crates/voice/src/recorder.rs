//! Recording session state machine.
//!
//! ```text
//!          start_recording           stop_recording
//!   Idle ──────────────────▶ Recording ────────────▶ Stopped
//!                              ▲   ⟲ tick()            │
//!                              └───── start_recording ─┘
//! ```
//!
//! The recorder owns the mounted storage and the codec for the whole
//! process. A start that fails after the file was touched drops back to
//! `Idle`; the last saved recording stays available for upload. At most
//! one file is open for recording at any time and every transition
//! overwrites [`Status`].

use core::fmt::Write as _;

use platform::{AudioCapture, MountConfig, Network, Storage};
use thiserror_no_std::Error;

use crate::config::{
    RecordingPath, VoiceConfig, APP_NAME, APP_VERSION, AUDIO_BUFFER_SIZE, FILE_EXTENSION, FILE_PREFIX,
};
use crate::mounter::{MountedStorage, StorageMounter};
use crate::status::Status;
use crate::upload::{UploadError, UploadReceipt, UploadRequest, UploadTransport};
use crate::wav::{WavFormat, WavWriter};

/// Externally visible session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecorderState {
    /// Nothing recorded yet, or the last start failed.
    Idle,
    /// Capture running into an open file.
    Recording,
    /// The last recording was finalized.
    Stopped,
}

/// Why `start_recording` did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartError {
    /// A session is already running.
    #[error("already recording")]
    AlreadyRecording,
    /// Storage was never mounted.
    #[error("storage not mounted")]
    StorageNotReady,
    /// No codec attached.
    #[error("no audio codec")]
    NoCodec,
    /// The generated file name did not fit.
    #[error("recording path too long")]
    PathTooLong,
    /// The recording file could not be created.
    #[error("cannot create recording file")]
    FileOpen,
    /// The codec refused to start.
    #[error("codec failed to start capture")]
    CodecStart,
}

impl StartError {
    /// Status reported for this refusal.
    pub const fn status(&self) -> Status {
        match self {
            Self::AlreadyRecording => Status::Recording,
            Self::StorageNotReady => Status::SdNotReady,
            Self::NoCodec => Status::NoAudio,
            Self::PathTooLong | Self::FileOpen => Status::FileError,
            Self::CodecStart => Status::CodecError,
        }
    }
}

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    /// File the recording was written to.
    pub path: RecordingPath,
    /// PCM bytes declared in the header.
    pub data_len: u32,
    /// `false` when the header rewrite failed and the file keeps its
    /// zeroed placeholder.
    pub header_written: bool,
}

enum Session<W> {
    Idle,
    Recording { writer: W, path: RecordingPath },
    Stopped,
}

/// Voice memo recorder.
pub struct Recorder<S: Storage, C: AudioCapture> {
    storage: Option<MountedStorage<S>>,
    codec: Option<C>,
    format: WavFormat,
    session: Session<WavWriter<S::File>>,
    last_saved: Option<RecordingPath>,
    next_index: u16,
    bytes_recorded: u32,
    status: Status,
    buffer: [u8; AUDIO_BUFFER_SIZE],
}

impl<S: Storage, C: AudioCapture> Recorder<S, C> {
    /// Recorder over already-resolved collaborators.
    ///
    /// Status starts at `Ready` with storage, `SD Failed` without.
    pub fn new(storage: Option<MountedStorage<S>>, codec: Option<C>, config: &VoiceConfig) -> Self {
        let status = if storage.is_some() {
            Status::Ready
        } else {
            Status::SdFailed
        };
        Self {
            storage,
            codec,
            format: WavFormat::from(config.audio),
            session: Session::Idle,
            last_saved: None,
            next_index: 1,
            bytes_recorded: 0,
            status,
            buffer: [0u8; AUDIO_BUFFER_SIZE],
        }
    }

    /// Mount the card, then build the recorder.
    ///
    /// A card that fails every mount configuration leaves the recorder
    /// without storage for the rest of the process.
    pub async fn setup(storage: S, codec: Option<C>, config: &VoiceConfig) -> Self {
        let mounted = StorageMounter::new().mount(storage).await.ok();
        if codec.is_none() {
            tracing::warn!("record: no audio codec attached");
        }
        let recorder = Self::new(mounted, codec, config);
        recorder.log_config(config);
        recorder
    }

    /// Open the next `voice_NNNN.wav` and start capture.
    ///
    /// Refusals leave the session state unchanged.
    pub async fn start_recording(&mut self) -> Result<(), StartError> {
        if self.is_recording() {
            tracing::warn!("record: start ignored, already recording");
            return Err(StartError::AlreadyRecording);
        }
        if self.storage.is_none() {
            return Err(self.refuse(StartError::StorageNotReady));
        }
        if self.codec.is_none() {
            return Err(self.refuse(StartError::NoCodec));
        }
        let path = match self.next_path() {
            Ok(path) => path,
            Err(e) => return Err(self.refuse(e)),
        };

        let format = self.format;
        let (Some(mounted), Some(codec)) = (self.storage.as_mut(), self.codec.as_mut()) else {
            return Err(StartError::StorageNotReady);
        };
        let storage = mounted.storage();

        if storage.exists(&path).await.unwrap_or(false) && storage.remove(&path).await.is_err() {
            tracing::warn!("record: could not remove stale {}", path.as_str());
        }
        let Ok(writer) = WavWriter::create(storage, &path, format).await else {
            tracing::error!("record: cannot create {}", path.as_str());
            self.session = Session::Idle;
            self.status = Status::FileError;
            return Err(StartError::FileOpen);
        };

        self.bytes_recorded = 0;
        if codec.start_capture().await.is_err() {
            tracing::error!("record: codec failed to start");
            writer.abandon().await;
            self.session = Session::Idle;
            self.status = Status::CodecError;
            return Err(StartError::CodecStart);
        }

        tracing::info!("record: started {}", path.as_str());
        self.session = Session::Recording { writer, path };
        self.status = Status::Recording;
        Ok(())
    }

    /// Move one buffer of audio from the codec to the card.
    ///
    /// Call repeatedly while recording. Returns the bytes that reached the
    /// card; an empty codec read, a codec error or a failed write all
    /// return 0 and leave the session running.
    pub async fn tick(&mut self) -> usize {
        let Session::Recording { writer, .. } = &mut self.session else {
            return 0;
        };
        let Some(codec) = self.codec.as_mut() else {
            return 0;
        };
        let n = match codec.read_samples(&mut self.buffer).await {
            Ok(n) => n.min(AUDIO_BUFFER_SIZE),
            Err(_) => {
                tracing::trace!("record: codec read error");
                return 0;
            }
        };
        if n == 0 {
            return 0;
        }
        match writer.append(self.buffer.get(..n).unwrap_or(&[])).await {
            Ok(written) => {
                let counted = u32::try_from(written).unwrap_or(u32::MAX);
                self.bytes_recorded = self.bytes_recorded.saturating_add(counted);
                written
            }
            Err(_) => {
                tracing::warn!("record: dropped {} bytes, storage write failed", n);
                0
            }
        }
    }

    /// Stop capture and finalize the file.
    ///
    /// Returns `None` when no session was running.
    pub async fn stop_recording(&mut self) -> Option<RecordingSummary> {
        if !self.is_recording() {
            return None;
        }
        let Session::Recording { writer, path } =
            core::mem::replace(&mut self.session, Session::Stopped)
        else {
            return None;
        };
        if let Some(codec) = self.codec.as_mut() {
            codec.stop_capture().await;
        }

        let data_len = self.bytes_recorded;
        let header_written = match writer.finalize(data_len).await {
            Ok(_) => true,
            Err(_) => {
                tracing::error!("record: header rewrite failed for {}", path.as_str());
                false
            }
        };
        tracing::info!("record: saved {} ({} bytes)", path.as_str(), data_len);

        self.last_saved = Some(path.clone());
        self.status = Status::Saved;
        Some(RecordingSummary {
            path,
            data_len,
            header_written,
        })
    }

    /// Upload the last saved recording through `transport`.
    pub async fn upload_recording<N: Network>(
        &mut self,
        transport: &mut UploadTransport<N>,
    ) -> Result<UploadReceipt, UploadError> {
        self.status = Status::Uploading;
        let request = UploadRequest {
            recording: matches!(self.session, Session::Recording { .. }),
            storage: self.storage.as_mut().map(|m| m.storage()),
            file: self.last_saved.as_deref(),
        };
        let result = transport.upload(request).await;
        self.status = match &result {
            Ok(_) => Status::Uploaded,
            Err(e) => {
                tracing::warn!("upload: failed ({})", e.status().as_str());
                e.status()
            }
        };
        result
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The file being recorded, or else the last saved one.
    pub fn current_file(&self) -> Option<&str> {
        match &self.session {
            Session::Recording { path, .. } => Some(path.as_str()),
            Session::Idle | Session::Stopped => self.last_saved.as_deref(),
        }
    }

    /// Session state.
    pub fn state(&self) -> RecorderState {
        match self.session {
            Session::Idle => RecorderState::Idle,
            Session::Recording { .. } => RecorderState::Recording,
            Session::Stopped => RecorderState::Stopped,
        }
    }

    /// `true` while a session is capturing.
    pub fn is_recording(&self) -> bool {
        matches!(self.session, Session::Recording { .. })
    }

    /// PCM bytes written in the current (or last) session.
    pub fn bytes_recorded(&self) -> u32 {
        self.bytes_recorded
    }

    /// `true` once the card mounted at setup.
    pub fn is_storage_ready(&self) -> bool {
        self.storage.is_some()
    }

    /// Configuration the card was mounted with.
    pub fn mount_config(&self) -> Option<MountConfig> {
        self.storage.as_ref().map(MountedStorage::config)
    }

    /// Format written into every header.
    pub fn format(&self) -> WavFormat {
        self.format
    }

    fn log_config(&self, config: &VoiceConfig) {
        tracing::info!("{} {}", APP_NAME, APP_VERSION);
        tracing::info!("  upload URL: {}", config.upload_url.as_str());
        match self.mount_config() {
            Some(mount) => tracing::info!(
                "  card: mounted, {} bus @ {} kHz",
                mount.bus.as_str(),
                mount.clock_khz()
            ),
            None => tracing::info!("  card: not mounted"),
        }
        if self.status.is_failure() {
            tracing::error!("  status: {}", self.status.as_str());
        } else {
            tracing::info!("  status: {}", self.status.as_str());
        }
    }

    fn refuse(&mut self, err: StartError) -> StartError {
        tracing::warn!("record: start refused ({})", err.status().as_str());
        self.status = err.status();
        err
    }

    fn next_path(&mut self) -> Result<RecordingPath, StartError> {
        let mut path = RecordingPath::new();
        write!(path, "/{FILE_PREFIX}{:04}{FILE_EXTENSION}", self.next_index)
            .map_err(|_| StartError::PathTooLong)?;
        self.next_index = self.next_index.wrapping_add(1);
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::wav::WavHeader;
    use platform::mocks::{MockCapture, MockStorage};

    fn config() -> VoiceConfig {
        VoiceConfig::new("http://127.0.0.1:8000/upload").unwrap()
    }

    async fn recorder(card: &MockStorage, codec: &MockCapture) -> Recorder<MockStorage, MockCapture> {
        Recorder::setup(card.clone(), Some(codec.clone()), &config()).await
    }

    #[tokio::test]
    async fn setup_reports_ready() {
        let rec = recorder(&MockStorage::new(), &MockCapture::new()).await;
        assert_eq!(rec.status(), Status::Ready);
        assert_eq!(rec.state(), RecorderState::Idle);
        assert!(rec.is_storage_ready());
        assert_eq!(rec.current_file(), None);
    }

    #[tokio::test]
    async fn setup_without_card_reports_sd_failed() {
        let rec = recorder(&MockStorage::failing_mounts(3), &MockCapture::new()).await;
        assert_eq!(rec.status(), Status::SdFailed);
        assert!(!rec.is_storage_ready());
        assert_eq!(rec.mount_config(), None);
    }

    #[tokio::test]
    async fn second_start_is_refused_without_side_effects() {
        let codec = MockCapture::new();
        let card = MockStorage::new();
        let mut rec = recorder(&card, &codec).await;
        rec.start_recording().await.unwrap();

        assert_eq!(rec.start_recording().await, Err(StartError::AlreadyRecording));
        assert_eq!(rec.status(), Status::Recording);
        assert_eq!(rec.state(), RecorderState::Recording);
        assert_eq!(codec.start_count(), 1);
        assert_eq!(card.file_count(), 1);
    }

    #[tokio::test]
    async fn codec_start_failure_abandons_file() {
        let card = MockStorage::new();
        let codec = MockCapture::failing_start();
        let mut rec = recorder(&card, &codec).await;

        assert_eq!(rec.start_recording().await, Err(StartError::CodecStart));
        assert_eq!(rec.status(), Status::CodecError);
        assert_eq!(rec.state(), RecorderState::Idle);
        assert_eq!(card.open_handles(), 0);
        assert_eq!(card.file("voice_0001.wav").unwrap(), vec![0u8; 44]);
    }

    #[tokio::test]
    async fn open_failure_reports_file_error() {
        let card = MockStorage::new();
        let codec = MockCapture::new();
        let mut rec = recorder(&card, &codec).await;
        card.set_fail_open(true);

        assert_eq!(rec.start_recording().await, Err(StartError::FileOpen));
        assert_eq!(rec.status(), Status::FileError);
        assert_eq!(rec.state(), RecorderState::Idle);
        assert_eq!(codec.start_count(), 0);
    }

    #[tokio::test]
    async fn file_names_are_sequential() {
        let card = MockStorage::new();
        let mut rec = recorder(&card, &MockCapture::new()).await;

        rec.start_recording().await.unwrap();
        assert_eq!(rec.current_file(), Some("/voice_0001.wav"));
        rec.stop_recording().await.unwrap();
        rec.start_recording().await.unwrap();
        let second = rec.stop_recording().await.unwrap();

        assert_eq!(second.path.as_str(), "/voice_0002.wav");
        assert_eq!(rec.current_file(), Some("/voice_0002.wav"));
        assert!(card.file("voice_0001.wav").is_some());
    }

    #[tokio::test]
    async fn stale_file_is_replaced() {
        let card = MockStorage::new();
        card.insert("/voice_0001.wav", b"left over from a previous boot");
        let mut rec = recorder(&card, &MockCapture::new()).await;

        rec.start_recording().await.unwrap();
        rec.stop_recording().await.unwrap();

        assert_eq!(card.removed(), vec!["voice_0001.wav".to_string()]);
        assert_eq!(card.file("voice_0001.wav").unwrap().len(), 44);
    }

    #[tokio::test]
    async fn ticks_accumulate_into_header() {
        let card = MockStorage::new();
        let codec = MockCapture::new();
        let mut rec = recorder(&card, &codec).await;
        rec.start_recording().await.unwrap();

        for fill in 1..=3u8 {
            codec.queue_chunk(&[fill; 512]);
            assert_eq!(rec.tick().await, 512);
        }
        assert_eq!(rec.bytes_recorded(), 1536);

        let summary = rec.stop_recording().await.unwrap();
        assert_eq!(summary.data_len, 1536);
        assert!(summary.header_written);

        let bytes = card.file("voice_0001.wav").unwrap();
        assert_eq!(bytes.len(), 1580);
        assert_eq!(WavHeader::parse(&bytes).unwrap().data_len, 1536);
        assert_eq!(&bytes[44 + 512..44 + 1024], &[2u8; 512][..]);
        assert!(!codec.is_capturing());
    }

    #[tokio::test]
    async fn oversized_chunk_is_read_in_buffer_sized_pieces() {
        let codec = MockCapture::new();
        let mut rec = recorder(&MockStorage::new(), &codec).await;
        rec.start_recording().await.unwrap();

        codec.queue_chunk(&[7u8; AUDIO_BUFFER_SIZE + 100]);
        assert_eq!(rec.tick().await, AUDIO_BUFFER_SIZE);
        assert_eq!(rec.tick().await, 100);
    }

    #[tokio::test]
    async fn empty_and_failed_reads_are_no_ops() {
        let codec = MockCapture::new();
        let mut rec = recorder(&MockStorage::new(), &codec).await;
        rec.start_recording().await.unwrap();

        assert_eq!(rec.tick().await, 0);
        codec.queue_read_error();
        assert_eq!(rec.tick().await, 0);
        assert_eq!(rec.bytes_recorded(), 0);
        assert!(rec.is_recording());
    }

    #[tokio::test]
    async fn write_failure_skips_chunk_and_keeps_recording() {
        let card = MockStorage::new();
        let codec = MockCapture::new();
        let mut rec = recorder(&card, &codec).await;
        rec.start_recording().await.unwrap();

        card.set_fail_writes(true);
        codec.queue_chunk(&[1u8; 64]);
        assert_eq!(rec.tick().await, 0);
        card.set_fail_writes(false);
        codec.queue_chunk(&[2u8; 64]);
        assert_eq!(rec.tick().await, 64);

        let summary = rec.stop_recording().await.unwrap();
        assert_eq!(summary.data_len, 64);
        assert_eq!(card.file("voice_0001.wav").unwrap().len(), 44 + 64);
    }

    #[tokio::test]
    async fn tick_while_idle_reads_nothing() {
        let codec = MockCapture::new();
        codec.queue_chunk(&[1u8; 32]);
        let mut rec = recorder(&MockStorage::new(), &codec).await;
        assert_eq!(rec.tick().await, 0);
    }

    #[tokio::test]
    async fn stop_without_session_is_a_no_op() {
        let codec = MockCapture::new();
        let mut rec = recorder(&MockStorage::new(), &codec).await;
        assert_eq!(rec.stop_recording().await, None);
        assert_eq!(rec.status(), Status::Ready);

        rec.start_recording().await.unwrap();
        assert!(rec.stop_recording().await.is_some());
        assert_eq!(rec.stop_recording().await, None);
        assert_eq!(rec.state(), RecorderState::Stopped);
        assert_eq!(rec.status(), Status::Saved);
        assert_eq!(codec.stop_count(), 1);
    }

    #[tokio::test]
    async fn failed_finalize_still_saves() {
        let card = MockStorage::new();
        let mut rec = recorder(&card, &MockCapture::new()).await;
        rec.start_recording().await.unwrap();
        card.set_fail_writes(true);

        let summary = rec.stop_recording().await.unwrap();
        assert!(!summary.header_written);
        assert_eq!(rec.status(), Status::Saved);
        assert_eq!(rec.current_file(), Some("/voice_0001.wav"));
        assert_eq!(card.open_handles(), 0);
    }

    #[tokio::test]
    async fn format_follows_configuration() {
        let mono = platform::AudioConfig {
            channels: 1,
            ..platform::AudioConfig::VOICE
        };
        let card = MockStorage::new();
        let cfg = config().with_audio(mono);
        let mut rec = Recorder::setup(card.clone(), Some(MockCapture::new()), &cfg).await;
        assert_eq!(rec.format().channels, 1);

        rec.start_recording().await.unwrap();
        rec.stop_recording().await.unwrap();
        let header = WavHeader::parse(&card.file("voice_0001.wav").unwrap()).unwrap();
        assert_eq!(header.format.channels, 1);
        assert_eq!(header.format.byte_rate(), 32_000);
    }
}
