//! Noise gate applied to inbound room audio.

use crate::audio::AudioFrame;
use crate::config::{NoiseCancellation, RoomInputOptions};

/// Silences frames whose RMS level is below `floor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseGate {
    floor: f32,
}

impl NoiseGate {
    pub fn new(floor: f32) -> Self {
        Self { floor: floor.max(0.0) }
    }

    /// `None` when noise cancellation is off.
    pub fn from_options(options: &RoomInputOptions) -> Option<Self> {
        match options.noise_cancellation {
            NoiseCancellation::Off => None,
            NoiseCancellation::Gate => Some(Self::new(options.noise_floor)),
        }
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Returns true if the frame was silenced.
    pub fn apply(&self, frame: &mut AudioFrame) -> bool {
        if frame.is_empty() || frame.rms() >= self.floor {
            return false;
        }
        frame.samples.iter_mut().for_each(|s| *s = 0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_frames_are_zeroed() {
        let gate = NoiseGate::new(0.01);
        let mut hiss = AudioFrame::mono(vec![40, -35, 50, -45], 16_000);
        assert!(gate.apply(&mut hiss));
        assert!(hiss.samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn speech_passes_untouched() {
        let gate = NoiseGate::new(0.01);
        let mut speech = AudioFrame::mono(vec![8000, -8000, 7000, -7500], 16_000);
        let before = speech.clone();
        assert!(!gate.apply(&mut speech));
        assert_eq!(speech, before);
    }

    #[test]
    fn off_means_no_gate() {
        let options = RoomInputOptions::default().with_noise_cancellation(NoiseCancellation::Off);
        assert!(NoiseGate::from_options(&options).is_none());
        assert_eq!(NoiseGate::from_options(&RoomInputOptions::default()).map(|g| g.floor()), Some(0.01));
    }
}
