//! Synthetic microphone for host recordings.
//!
//! Produces a fixed-length 16-bit sine tone, duplicated across channels,
//! then reads as silence (zero bytes) so the caller knows to stop.

// Sample synthesis is float math by nature; the casts are range-checked
// by construction (amplitude ≤ 1.0, frame counts from seconds × rate).
#![allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use std::convert::Infallible;
use std::f32::consts::TAU;

use platform::{AudioCapture, AudioConfig};

const BYTES_PER_SAMPLE: usize = 2;

pub struct ToneCapture {
    frame_bytes: usize,
    step: f32,
    phase: f32,
    amplitude: f32,
    frames_left: u64,
    running: bool,
}

impl ToneCapture {
    /// Tone in `config`'s rate and channel layout. Samples are always 16-bit.
    pub fn new(config: AudioConfig, frequency: f32, seconds: f32) -> Self {
        let rate = config.sample_rate.max(1) as f32;
        let layout = AudioConfig {
            sample_rate: config.sample_rate,
            channels: config.channels.max(1),
            bit_depth: 16,
        };
        Self {
            frame_bytes: usize::from(layout.frame_bytes()),
            step: TAU * frequency / rate,
            phase: 0.0,
            amplitude: 0.5,
            frames_left: (seconds.max(0.0) * rate) as u64,
            running: false,
        }
    }

}

impl AudioCapture for ToneCapture {
    type Error = Infallible;

    async fn start_capture(&mut self) -> Result<(), Self::Error> {
        self.running = true;
        Ok(())
    }

    async fn stop_capture(&mut self) {
        self.running = false;
    }

    async fn read_samples(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !self.running {
            return Ok(0);
        }
        let frame_bytes = self.frame_bytes;
        let mut written = 0;
        for frame in buf.chunks_exact_mut(frame_bytes) {
            if self.frames_left == 0 {
                break;
            }
            let sample = (self.phase.sin() * self.amplitude * f32::from(i16::MAX)) as i16;
            for slot in frame.chunks_exact_mut(BYTES_PER_SAMPLE) {
                slot.copy_from_slice(&sample.to_le_bytes());
            }
            self.phase = (self.phase + self.step) % TAU;
            self.frames_left -= 1;
            written += frame_bytes;
        }
        Ok(written)
    }
}
