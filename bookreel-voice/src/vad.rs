//! Voice activity detection.
//!
//! The WebRTC detector is not `Send`, so detection and turn tracking run on
//! a dedicated thread per session ([`VadWorker`]) that talks to the async
//! side over channels.

use crate::audio::{AudioFormat, AudioFrame, FrameSplitter};
use crate::config::{TurnConfig, VadConfig, VadKind};
use crate::error::{Result, VoiceError};
use crate::turn::{TurnDetector, TurnEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc_vad::{SampleRate, Vad, VadMode};

/// Classifies fixed-size windows as speech or not.
pub trait VoiceActivityDetector {
    /// Samples per window this detector expects.
    fn frame_len(&self) -> usize;

    fn is_speech(&mut self, window: &[i16]) -> Result<bool>;
}

pub struct WebRtcVad {
    vad: Vad,
    frame_len: usize,
}

impl WebRtcVad {
    pub fn new(config: &VadConfig) -> Result<Self> {
        config.validate()?;
        let sample_rate = match config.sample_rate {
            8000 => SampleRate::Rate8kHz,
            16000 => SampleRate::Rate16kHz,
            32000 => SampleRate::Rate32kHz,
            48000 => SampleRate::Rate48kHz,
            other => return Err(VoiceError::config(format!("invalid sample rate: {other}"))),
        };
        let mode = match config.mode {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            _ => VadMode::VeryAggressive,
        };
        let vad = Vad::new_with_rate_and_mode(sample_rate, mode);
        debug!(sample_rate = config.sample_rate, mode = config.mode, "webrtc vad ready");
        Ok(Self { vad, frame_len: config.frame_len() })
    }
}

impl VoiceActivityDetector for WebRtcVad {
    fn frame_len(&self) -> usize {
        self.frame_len
    }

    fn is_speech(&mut self, window: &[i16]) -> Result<bool> {
        if window.len() != self.frame_len {
            return Err(VoiceError::Vad(format!(
                "expected {} samples, got {}",
                self.frame_len,
                window.len()
            )));
        }
        self.vad
            .is_voice_segment(window)
            .map_err(|_| VoiceError::Vad("webrtc vad rejected the frame".to_string()))
    }
}

/// RMS threshold detector. Deterministic, which makes it the one to use in
/// tests.
#[derive(Debug, Clone)]
pub struct EnergyVad {
    threshold: f32,
    frame_len: usize,
}

impl EnergyVad {
    pub fn new(config: &VadConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { threshold: config.energy_threshold, frame_len: config.frame_len() })
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn frame_len(&self) -> usize {
        self.frame_len
    }

    fn is_speech(&mut self, window: &[i16]) -> Result<bool> {
        Ok(crate::audio::rms(window) >= self.threshold)
    }
}

pub fn build_detector(config: &VadConfig) -> Result<Box<dyn VoiceActivityDetector>> {
    Ok(match config.kind {
        VadKind::WebRtc => Box::new(WebRtcVad::new(config)?),
        VadKind::Energy => Box::new(EnergyVad::new(config)?),
    })
}

/// Runs a detector and a [`TurnDetector`] on their own thread.
///
/// The thread exits when the frame sender is dropped, after flushing any
/// pending turn, or when the event receiver goes away.
pub struct VadWorker {
    handle: std::thread::JoinHandle<()>,
}

impl VadWorker {
    pub fn spawn(
        vad: VadConfig,
        turn: TurnConfig,
        mut frames: mpsc::UnboundedReceiver<AudioFrame>,
        events: mpsc::UnboundedSender<TurnEvent>,
    ) -> Result<Self> {
        vad.validate()?;
        let handle = std::thread::Builder::new()
            .name("bookreel-vad".to_string())
            .spawn(move || {
                let mut detector = match build_detector(&vad) {
                    Ok(detector) => detector,
                    Err(e) => {
                        warn!(error = %e, "failed to create VAD");
                        return;
                    }
                };
                let format = AudioFormat::mono(vad.sample_rate);
                let mut splitter = FrameSplitter::new(detector.frame_len());
                let mut turns = TurnDetector::new(turn, format);
                info!(frame_len = detector.frame_len(), "vad thread started");

                while let Some(frame) = frames.blocking_recv() {
                    if frame.format.sample_rate != vad.sample_rate || frame.format.channels != 1 {
                        warn!(
                            sample_rate = frame.format.sample_rate,
                            channels = frame.format.channels,
                            "dropping frame in unexpected format"
                        );
                        continue;
                    }
                    for window in splitter.push(&frame.samples) {
                        let speech = match detector.is_speech(&window) {
                            Ok(speech) => speech,
                            Err(e) => {
                                warn!(error = %e, "vad failed on window");
                                false
                            }
                        };
                        if let Some(event) = turns.push(speech, &window) {
                            if events.send(event).is_err() {
                                return;
                            }
                        }
                    }
                }

                if let Some(event) = turns.flush() {
                    let _ = events.send(event);
                }
                debug!("vad thread finished");
            })
            .map_err(|e| VoiceError::Vad(format!("failed to spawn vad thread: {e}")))?;
        Ok(Self { handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the thread exits.
    pub fn join(self) -> Result<()> {
        self.handle.join().map_err(|_| VoiceError::Vad("vad thread panicked".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webrtc_vad_needs_exact_windows() {
        let mut vad = WebRtcVad::new(&VadConfig::default()).unwrap();
        assert_eq!(vad.frame_len(), 480);
        assert!(vad.is_speech(&[0; 100]).is_err());
        assert!(!vad.is_speech(&[0; 480]).unwrap());
    }

    #[test]
    fn energy_vad_thresholds_rms() {
        let mut vad = EnergyVad::new(&VadConfig::energy(0.05)).unwrap();
        assert!(!vad.is_speech(&[100; 480]).unwrap());
        assert!(vad.is_speech(&[10_000; 480]).unwrap());
    }

    #[test]
    fn worker_turns_frames_into_turn_events() {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let worker =
            VadWorker::spawn(VadConfig::energy(0.05), TurnConfig::default(), frame_rx, event_tx)
                .unwrap();

        // 20 ms frames, as a room would deliver them.
        for _ in 0..30 {
            frame_tx.send(AudioFrame::mono(vec![10_000; 320], 16_000)).unwrap();
        }
        for _ in 0..30 {
            frame_tx.send(AudioFrame::mono(vec![0; 320], 16_000)).unwrap();
        }
        drop(frame_tx);
        worker.join().unwrap();

        assert_eq!(event_rx.try_recv().unwrap(), TurnEvent::SpeechStarted);
        match event_rx.try_recv().unwrap() {
            TurnEvent::TurnCommitted { speech_ms, .. } => assert_eq!(speech_ms, 600),
            other => panic!("unexpected {other:?}"),
        }
        assert!(event_rx.try_recv().is_err());
    }
}
