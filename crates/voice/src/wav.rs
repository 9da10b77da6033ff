//! Streaming WAV container writer.
//!
//! A recording is written in one pass without knowing its length up front:
//!
//! ```text
//! open      → 44 zero bytes (placeholder header), data region starts at 44
//! append    → raw PCM, passthrough to the card
//! finalize  → seek 0, overwrite the 44 bytes with the real header, close
//! ```
//!
//! Header layout (all integers little-endian):
//!
//! ```text
//! [0-3]    "RIFF"
//! [4-7]    RIFF chunk size = 36 + data_len
//! [8-11]   "WAVE"
//! [12-15]  "fmt "
//! [16-19]  16 (PCM fmt chunk size)
//! [20-21]  1 (PCM format code)
//! [22-23]  channels
//! [24-27]  sample_rate
//! [28-31]  byte_rate = sample_rate * channels * bits / 8
//! [32-33]  block_align = channels * bits / 8
//! [34-35]  bits_per_sample
//! [36-39]  "data"
//! [40-43]  data_len
//! ```
//!
//! A writer dropped without [`WavWriter::finalize`] leaves a zeroed header:
//! the PCM is on the card but players see a zero-length file. That is the
//! expected outcome of a crash mid-recording.

use platform::{AudioConfig, File, OpenMode, Storage};
use thiserror_no_std::Error;

/// Size of the canonical WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const FMT_CHUNK_SIZE: u32 = 16;
const PCM_FORMAT: u16 = 1;
/// Bytes of header that follow the RIFF size field.
const RIFF_OVERHEAD: u32 = 36;

/// PCM parameters recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WavFormat {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Bytes per second of audio.
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate
            .saturating_mul(self.channels as u32)
            .saturating_mul(self.bits_per_sample as u32)
            / 8
    }

    /// Bytes per interleaved frame.
    pub const fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bits_per_sample) / 8
    }
}

impl From<AudioConfig> for WavFormat {
    fn from(cfg: AudioConfig) -> Self {
        Self {
            sample_rate: cfg.sample_rate,
            channels: u16::from(cfg.channels),
            bits_per_sample: u16::from(cfg.bit_depth),
        }
    }
}

/// Decoded canonical header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WavHeader {
    /// PCM parameters.
    pub format: WavFormat,
    /// Length of the data subchunk in bytes.
    pub data_len: u32,
}

/// Reasons a 44-byte block is not a canonical PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderError {
    /// Fewer than 44 bytes.
    #[error("header shorter than 44 bytes")]
    TooShort,
    /// A RIFF/WAVE/fmt/data tag is wrong.
    #[error("missing RIFF/WAVE/fmt/data tag")]
    BadTag,
    /// Format code or fmt size is not plain PCM.
    #[error("not a PCM fmt chunk")]
    NotPcm,
}

impl WavHeader {
    /// Header describing `data_len` bytes of `format` audio.
    pub const fn new(format: WavFormat, data_len: u32) -> Self {
        Self { format, data_len }
    }

    /// RIFF chunk size field: everything after the first 8 bytes.
    pub const fn riff_chunk_size(&self) -> u32 {
        RIFF_OVERHEAD.saturating_add(self.data_len)
    }

    /// Serialize to the 44-byte on-disk form.
    pub fn encode(&self) -> [u8; WAV_HEADER_SIZE] {
        let riff = self.riff_chunk_size().to_le_bytes();
        let fmt_size = FMT_CHUNK_SIZE.to_le_bytes();
        let pcm = PCM_FORMAT.to_le_bytes();
        let channels = self.format.channels.to_le_bytes();
        let rate = self.format.sample_rate.to_le_bytes();
        let byte_rate = self.format.byte_rate().to_le_bytes();
        let align = self.format.block_align().to_le_bytes();
        let bits = self.format.bits_per_sample.to_le_bytes();
        let data_len = self.data_len.to_le_bytes();

        let fields: [&[u8]; 13] = [
            b"RIFF", &riff, b"WAVE", b"fmt ", &fmt_size, &pcm, &channels, &rate, &byte_rate,
            &align, &bits, b"data", &data_len,
        ];

        let mut out = [0u8; WAV_HEADER_SIZE];
        let mut pos = 0usize;
        for field in fields {
            let end = pos.saturating_add(field.len());
            if let Some(dst) = out.get_mut(pos..end) {
                dst.copy_from_slice(field);
            }
            pos = end;
        }
        out
    }

    /// Parse a canonical header from the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(HeaderError::TooShort);
        }
        let tagged = has_tag(bytes, 0, b"RIFF")
            && has_tag(bytes, 8, b"WAVE")
            && has_tag(bytes, 12, b"fmt ")
            && has_tag(bytes, 36, b"data");
        if !tagged {
            return Err(HeaderError::BadTag);
        }
        if le_u32(bytes, 16) != Some(FMT_CHUNK_SIZE) || le_u16(bytes, 20) != Some(PCM_FORMAT) {
            return Err(HeaderError::NotPcm);
        }
        let field16 = |at| le_u16(bytes, at).ok_or(HeaderError::TooShort);
        let field32 = |at| le_u32(bytes, at).ok_or(HeaderError::TooShort);
        Ok(Self {
            format: WavFormat {
                channels: field16(22)?,
                sample_rate: field32(24)?,
                bits_per_sample: field16(34)?,
            },
            data_len: field32(40)?,
        })
    }
}

fn has_tag(bytes: &[u8], at: usize, want: &[u8; 4]) -> bool {
    bytes.get(at..at.saturating_add(4)) == Some(&want[..])
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes(raw.try_into().ok()?))
}

fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes(raw.try_into().ok()?))
}

/// Errors from the container writer.
#[derive(Debug, Error)]
pub enum WavError<E: core::fmt::Debug> {
    /// The storage driver reported an error.
    #[error("storage I/O error: {0:?}")]
    Io(E),
    /// The storage driver accepted zero bytes of a non-empty write.
    #[error("storage accepted a short write")]
    ShortWrite,
}

async fn write_all<F: File>(file: &mut F, mut buf: &[u8]) -> Result<(), WavError<F::Error>> {
    while !buf.is_empty() {
        let n = file.write(buf).await.map_err(WavError::Io)?;
        if n == 0 {
            return Err(WavError::ShortWrite);
        }
        buf = buf.get(n..).unwrap_or(&[]);
    }
    Ok(())
}

/// An open recording file.
///
/// [`finalize`](Self::finalize) and [`abandon`](Self::abandon) consume the
/// writer, so the header can be rewritten at most once per file.
pub struct WavWriter<F: File> {
    file: F,
    format: WavFormat,
}

impl<F: File> WavWriter<F> {
    /// Create (or truncate) `path` and reserve the header.
    pub async fn create<S>(
        storage: &mut S,
        path: &str,
        format: WavFormat,
    ) -> Result<Self, WavError<F::Error>>
    where
        S: Storage<File = F, Error = F::Error>,
    {
        let mut file = storage
            .open(path, OpenMode::WriteTruncate)
            .await
            .map_err(WavError::Io)?;
        if let Err(e) = write_all(&mut file, &[0u8; WAV_HEADER_SIZE]).await {
            let _ = file.close().await;
            return Err(e);
        }
        tracing::debug!("wav: reserved header in {}", path);
        Ok(Self { file, format })
    }

    /// Write PCM at the end of the data region.
    ///
    /// Returns the number of bytes the card accepted, which may be less
    /// than `pcm.len()`. The caller owns the running total.
    pub async fn append(&mut self, pcm: &[u8]) -> Result<usize, WavError<F::Error>> {
        self.file.write(pcm).await.map_err(WavError::Io)
    }

    /// Format the header will declare.
    pub fn format(&self) -> WavFormat {
        self.format
    }

    /// Rewrite the header for `data_len` PCM bytes, flush and close.
    ///
    /// The file is closed even when the header write fails.
    pub async fn finalize(mut self, data_len: u32) -> Result<WavHeader, WavError<F::Error>> {
        let header = WavHeader::new(self.format, data_len);
        let rewrite = async {
            self.file.seek(0).await.map_err(WavError::Io)?;
            write_all(&mut self.file, &header.encode()).await?;
            self.file.flush().await.map_err(WavError::Io)
        }
        .await;
        let closed = self.file.close().await.map_err(WavError::Io);
        rewrite?;
        closed?;
        tracing::debug!("wav: finalized header, data_len={}", data_len);
        Ok(header)
    }

    /// Close without writing the header.
    pub async fn abandon(self) {
        let _ = self.file.close().await;
    }
}
