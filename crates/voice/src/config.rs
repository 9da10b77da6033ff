//! Recorder configuration and constants
//!
//! Central values for the memo recorder. Everything that sizes a buffer or
//! shapes a file name lives here rather than at the use site.

use heapless::String;
use platform::AudioConfig;

/// The application name
pub const APP_NAME: &str = "Voice Memo";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bytes pulled from the codec per tick.
///
/// At 16 kHz stereo 16-bit this is 16 ms of audio, which keeps one tick's
/// storage write well inside the scheduler slice.
pub const AUDIO_BUFFER_SIZE: usize = 1024;

/// Bytes read from storage per network write during upload.
pub const UPLOAD_CHUNK_SIZE: usize = 1024;

/// Recording file name prefix; files are `voice_0001.wav`, `voice_0002.wav`, ...
pub const FILE_PREFIX: &str = "voice_";

/// Recording file name extension.
pub const FILE_EXTENSION: &str = ".wav";

/// Capacity of a recording path.
pub const MAX_PATH_LEN: usize = 32;

/// Capacity of the configured upload URL.
pub const MAX_URL_LEN: usize = 192;

/// Fixed-capacity recording path.
pub type RecordingPath = String<MAX_PATH_LEN>;

/// Recorder configuration supplied at board bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConfig {
    /// Upload endpoint, e.g. `http://192.168.1.119:8000/upload`.
    pub upload_url: String<MAX_URL_LEN>,
    /// Capture format. Also written into every WAV header.
    pub audio: AudioConfig,
}

impl VoiceConfig {
    /// Build a configuration with the device capture format.
    ///
    /// Returns `None` if `upload_url` exceeds [`MAX_URL_LEN`].
    pub fn new(upload_url: &str) -> Option<Self> {
        Some(Self {
            upload_url: String::try_from(upload_url).ok()?,
            audio: AudioConfig::VOICE,
        })
    }

    /// Override the capture format.
    #[must_use]
    pub fn with_audio(mut self, audio: AudioConfig) -> Self {
        self.audio = audio;
        self
    }
}
