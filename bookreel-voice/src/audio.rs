//! PCM16 audio frames and helpers.

use crate::error::{Result, VoiceError};
use serde::{Deserialize, Serialize};

/// Sample rate used for everything on the listening side (VAD, STT).
pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of synthesized speech published to the room.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Sample layout of a [`AudioFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::mono(INPUT_SAMPLE_RATE)
    }
}

impl AudioFormat {
    pub fn mono(sample_rate: u32) -> Self {
        Self { sample_rate, channels: 1 }
    }

    /// Number of interleaved samples covering `ms` milliseconds.
    pub fn samples_for_ms(&self, ms: u32) -> usize {
        (self.sample_rate as u64 * self.channels as u64 * ms as u64 / 1000) as usize
    }

    pub fn ms_for_samples(&self, samples: usize) -> u64 {
        let per_second = self.sample_rate as u64 * self.channels.max(1) as u64;
        if per_second == 0 {
            return 0;
        }
        samples as u64 * 1000 / per_second
    }
}

/// Interleaved signed 16-bit samples.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub format: AudioFormat,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>, format: AudioFormat) -> Self {
        Self { samples, format }
    }

    /// Mono frame at `sample_rate`.
    pub fn mono(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self::new(samples, AudioFormat::mono(sample_rate))
    }

    pub fn silence(ms: u32, format: AudioFormat) -> Self {
        Self::new(vec![0; format.samples_for_ms(ms)], format)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_ms(&self) -> u64 {
        self.format.ms_for_samples(self.samples.len())
    }

    /// Samples per channel, as room transports describe frames.
    pub fn samples_per_channel(&self) -> u32 {
        (self.samples.len() / self.format.channels.max(1) as usize) as u32
    }

    /// Little-endian PCM16 bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        if cfg!(target_endian = "little") {
            bytemuck::cast_slice::<i16, u8>(&self.samples).to_vec()
        } else {
            self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
        }
    }

    /// Parse little-endian PCM16 bytes. Odd lengths are rejected.
    pub fn from_le_bytes(bytes: &[u8], format: AudioFormat) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(VoiceError::audio(format!(
                "invalid data length for PCM16: {} (must be even)",
                bytes.len()
            )));
        }
        let samples =
            bytes.chunks_exact(2).map(|pair| i16::from_le_bytes([pair[0], pair[1]])).collect();
        Ok(Self::new(samples, format))
    }

    /// Root mean square level, normalized to `0.0..=1.0`.
    pub fn rms(&self) -> f32 {
        rms(&self.samples)
    }

    pub fn append(&mut self, other: &AudioFrame) {
        self.samples.extend_from_slice(&other.samples);
    }
}

pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64 / i16::MAX as f64;
            v * v
        })
        .sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Re-slices arbitrary frames into fixed-size windows.
///
/// Room transports deliver 10 ms or 20 ms frames; the VAD wants exactly
/// 10, 20 or 30 ms.
#[derive(Debug, Clone)]
pub struct FrameSplitter {
    window: usize,
    pending: Vec<i16>,
}

impl FrameSplitter {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1), pending: Vec::new() }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Append `samples` and drain every complete window.
    pub fn push(&mut self, samples: &[i16]) -> Vec<Vec<i16>> {
        self.pending.extend_from_slice(samples);
        let complete = self.pending.len() / self.window * self.window;
        if complete == 0 {
            return Vec::new();
        }
        let rest = self.pending.split_off(complete);
        let ready = std::mem::replace(&mut self.pending, rest);
        ready.chunks_exact(self.window).map(<[i16]>::to_vec).collect()
    }

    /// Leftover samples shorter than one window.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
