//! Silence-gap turn detection.
//!
//! Timing is counted in samples rather than wall-clock time, so the same
//! audio always yields the same turns.

use crate::audio::{AudioFormat, AudioFrame};
use crate::config::TurnConfig;
use tracing::{debug, info};

/// Events emitted towards the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// The user started speaking.
    SpeechStarted,
    /// The user finished a turn; `audio` covers speech plus trailing silence.
    TurnCommitted { audio: AudioFrame, speech_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Idle,
    Speaking,
    Trailing,
}

#[derive(Debug)]
pub struct TurnDetector {
    config: TurnConfig,
    format: AudioFormat,
    state: TurnState,
    buffer: Vec<i16>,
    speech_samples: usize,
    silence_samples: usize,
}

impl TurnDetector {
    pub fn new(config: TurnConfig, format: AudioFormat) -> Self {
        Self {
            config,
            format,
            state: TurnState::Idle,
            buffer: Vec::new(),
            speech_samples: 0,
            silence_samples: 0,
        }
    }

    /// Feed one VAD window and its verdict.
    pub fn push(&mut self, is_speech: bool, window: &[i16]) -> Option<TurnEvent> {
        match (self.state, is_speech) {
            (TurnState::Idle, false) => None,
            (TurnState::Idle, true) => {
                debug!("speech started");
                self.state = TurnState::Speaking;
                self.buffer.clear();
                self.buffer.extend_from_slice(window);
                self.speech_samples = window.len();
                self.silence_samples = 0;
                Some(TurnEvent::SpeechStarted)
            }
            (TurnState::Speaking | TurnState::Trailing, true) => {
                self.state = TurnState::Speaking;
                self.buffer.extend_from_slice(window);
                self.speech_samples += window.len();
                self.silence_samples = 0;
                if self.format.ms_for_samples(self.buffer.len()) >= self.config.max_turn_ms as u64 {
                    info!(max_turn_ms = self.config.max_turn_ms, "max turn length reached, committing");
                    return self.commit();
                }
                None
            }
            (TurnState::Speaking | TurnState::Trailing, false) => {
                self.state = TurnState::Trailing;
                self.buffer.extend_from_slice(window);
                self.silence_samples += window.len();
                if self.format.ms_for_samples(self.silence_samples)
                    >= self.config.min_silence_ms as u64
                {
                    return self.commit();
                }
                None
            }
        }
    }

    /// Commit whatever is buffered, e.g. when the audio stream ends.
    pub fn flush(&mut self) -> Option<TurnEvent> {
        if self.state == TurnState::Idle {
            return None;
        }
        self.commit()
    }

    fn commit(&mut self) -> Option<TurnEvent> {
        let speech_ms = self.format.ms_for_samples(self.speech_samples);
        let audio = std::mem::take(&mut self.buffer);
        self.reset();

        if speech_ms < self.config.min_speech_ms as u64 {
            debug!(speech_ms, "speech too short, ignoring");
            return None;
        }
        info!(speech_ms, samples = audio.len(), "turn committed");
        Some(TurnEvent::TurnCommitted { audio: AudioFrame::new(audio, self.format), speech_ms })
    }

    fn reset(&mut self) {
        self.state = TurnState::Idle;
        self.buffer.clear();
        self.speech_samples = 0;
        self.silence_samples = 0;
    }

    pub fn state(&self) -> &'static str {
        match self.state {
            TurnState::Idle => "idle",
            TurnState::Speaking => "speaking",
            TurnState::Trailing => "trailing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: usize = 480;

    fn detector() -> TurnDetector {
        TurnDetector::new(TurnConfig::default(), AudioFormat::mono(16_000))
    }

    fn feed(detector: &mut TurnDetector, speech: bool, windows: usize) -> Vec<TurnEvent> {
        (0..windows).filter_map(|_| detector.push(speech, &[1; WINDOW])).collect()
    }

    #[test]
    fn commits_after_silence_gap() {
        let mut d = detector();
        assert_eq!(feed(&mut d, true, 1), vec![TurnEvent::SpeechStarted]);
        assert!(feed(&mut d, true, 19).is_empty());
        assert_eq!(d.state(), "speaking");

        // 16 windows = 480 ms of silence: not yet.
        assert!(feed(&mut d, false, 16).is_empty());
        assert_eq!(d.state(), "trailing");

        let events = feed(&mut d, false, 1);
        match events.as_slice() {
            [TurnEvent::TurnCommitted { audio, speech_ms }] => {
                assert_eq!(*speech_ms, 600);
                assert_eq!(audio.len(), 37 * WINDOW);
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert_eq!(d.state(), "idle");
    }

    #[test]
    fn short_pause_does_not_split_a_turn() {
        let mut d = detector();
        feed(&mut d, true, 10);
        assert!(feed(&mut d, false, 5).is_empty());
        assert!(feed(&mut d, true, 10).is_empty());
        assert_eq!(d.state(), "speaking");
    }

    #[test]
    fn blips_shorter_than_min_speech_are_dropped() {
        let mut d = detector();
        feed(&mut d, true, 3);
        assert!(feed(&mut d, false, 20).is_empty());
        assert_eq!(d.state(), "idle");
    }

    #[test]
    fn long_turns_are_force_committed() {
        let config = TurnConfig { max_turn_ms: 900, ..Default::default() };
        let mut d = TurnDetector::new(config, AudioFormat::mono(16_000));
        let events = feed(&mut d, true, 30);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], TurnEvent::TurnCommitted { speech_ms: 900, .. }));
    }

    #[test]
    fn flush_commits_pending_speech() {
        let mut d = detector();
        feed(&mut d, true, 10);
        assert!(matches!(d.flush(), Some(TurnEvent::TurnCommitted { speech_ms: 300, .. })));
        assert_eq!(d.flush(), None);
    }
}
