//! Externally visible recorder status.
//!
//! One value, overwritten on every transition. Displays and telemetry read
//! it through [`Recorder::status`](crate::Recorder::status); nothing in the
//! core branches on it.

/// Human-readable recorder status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Storage mounted, nothing in progress.
    Ready,
    /// Every mount configuration failed at setup.
    SdFailed,
    /// Recording or upload attempted without mounted storage.
    SdNotReady,
    /// Recording attempted without a codec attached.
    NoAudio,
    /// A recording or upload file could not be opened.
    FileError,
    /// The codec refused to start capture.
    CodecError,
    /// Capture is running.
    Recording,
    /// The last recording was finalized.
    Saved,
    /// Upload attempted while recording.
    StopFirst,
    /// Upload attempted before any recording was saved.
    NoFile,
    /// Upload attempted without network connectivity.
    NoWifi,
    /// The configured upload URL is malformed.
    BadUrl,
    /// The recording holds no audio payload.
    EmptyFile,
    /// Upload exchange in progress.
    Uploading,
    /// The upload server could not be reached.
    ConnectFail,
    /// The server accepted the upload.
    Uploaded,
    /// The server rejected the upload or the exchange broke down.
    UploadFail,
}

impl Status {
    /// Label shown on the device and reported to telemetry.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::SdFailed => "SD Failed",
            Self::SdNotReady => "SD Not Ready",
            Self::NoAudio => "No Audio",
            Self::FileError => "File Error",
            Self::CodecError => "Codec Error",
            Self::Recording => "Recording",
            Self::Saved => "Saved",
            Self::StopFirst => "Stop First",
            Self::NoFile => "No File",
            Self::NoWifi => "No WiFi",
            Self::BadUrl => "Bad URL",
            Self::EmptyFile => "Empty File",
            Self::Uploading => "Uploading",
            Self::ConnectFail => "Connect Fail",
            Self::Uploaded => "Uploaded",
            Self::UploadFail => "Upload Fail",
        }
    }

    /// Returns `true` for statuses that report a failed operation.
    pub const fn is_failure(self) -> bool {
        !matches!(
            self,
            Self::Ready | Self::Recording | Self::Saved | Self::Uploading | Self::Uploaded
        )
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
