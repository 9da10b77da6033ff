//! Audio capture abstraction

/// Microphone-side codec interface.
///
/// The driver owns the I2S/DMA plumbing; callers only start, stop and drain
/// it. Implementations must bound the time spent in
/// [`read_samples`](AudioCapture::read_samples) (the reference driver waits
/// at most 20 ms for the DMA ring) so a periodic caller is never starved.
pub trait AudioCapture {
    /// Error type
    type Error: core::fmt::Debug;

    /// Begin filling the capture ring.
    fn start_capture(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Stop capture. Idempotent.
    fn stop_capture(&mut self) -> impl core::future::Future<Output = ()>;

    /// Copy up to `buf.len()` bytes of interleaved little-endian PCM into `buf`.
    ///
    /// `Ok(0)` means no data was ready (underrun) and is not an error.
    fn read_samples(
        &mut self,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>>;
}

/// Audio configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u8,
    /// Bit depth (16 or 24)
    pub bit_depth: u8,
}

impl AudioConfig {
    /// Voice memo capture format: 16 kHz, stereo, 16-bit.
    pub const VOICE: Self = Self {
        sample_rate: 16_000,
        channels: 2,
        bit_depth: 16,
    };

    /// Bytes per interleaved frame (all channels of one sample instant).
    pub const fn frame_bytes(&self) -> u16 {
        (self.channels as u16).saturating_mul((self.bit_depth / 8) as u16)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::VOICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_voice_format() {
        let cfg = AudioConfig::default();
        assert_eq!(cfg.sample_rate, 16_000);
        assert_eq!(cfg.channels, 2);
        assert_eq!(cfg.bit_depth, 16);
    }

    #[test]
    fn frame_bytes_stereo_16bit() {
        assert_eq!(AudioConfig::VOICE.frame_bytes(), 4);
    }

    #[test]
    fn frame_bytes_mono_16bit() {
        let cfg = AudioConfig { channels: 1, ..AudioConfig::VOICE };
        assert_eq!(cfg.frame_bytes(), 2);
    }
}
