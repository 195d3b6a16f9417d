//! Configuration types for voice sessions.
//!
//! Every type deserializes with defaults, so a settings file only needs the
//! fields it overrides.

use crate::audio::INPUT_SAMPLE_RATE;
use crate::error::{Result, VoiceError};
use serde::{Deserialize, Serialize};

/// Speech-to-text settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    pub model: String,
    /// BCP-47 language hint sent to the recognizer.
    pub language: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self { model: "nova-3".to_string(), language: "en".to_string() }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub model: String,
    /// Voice override. Deepgram encodes the voice in the model name, so this
    /// replaces `model` when set.
    pub voice: Option<String>,
    pub sample_rate: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: "aura-asteria-en".to_string(),
            voice: None,
            sample_rate: crate::audio::OUTPUT_SAMPLE_RATE,
        }
    }
}

impl TtsConfig {
    /// Model name actually requested.
    pub fn effective_model(&self) -> &str {
        self.voice.as_deref().filter(|v| !v.is_empty()).unwrap_or(&self.model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VadKind {
    /// WebRTC VAD.
    #[default]
    WebRtc,
    /// Plain RMS threshold.
    Energy,
}

/// Voice activity detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    pub kind: VadKind,
    /// WebRTC aggressiveness, 0 (quality) to 3 (very aggressive).
    pub mode: u8,
    /// 8000, 16000, 32000 or 48000.
    pub sample_rate: u32,
    /// 10, 20 or 30.
    pub frame_ms: u32,
    /// RMS level counted as speech by the energy detector.
    pub energy_threshold: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            kind: VadKind::WebRtc,
            mode: 3,
            sample_rate: INPUT_SAMPLE_RATE,
            frame_ms: 30,
            energy_threshold: 0.02,
        }
    }
}

impl VadConfig {
    pub fn energy(threshold: f32) -> Self {
        Self { kind: VadKind::Energy, energy_threshold: threshold, ..Default::default() }
    }

    /// Samples per VAD window.
    pub fn frame_len(&self) -> usize {
        (self.sample_rate as u64 * self.frame_ms as u64 / 1000) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.sample_rate, 8000 | 16000 | 32000 | 48000) {
            return Err(VoiceError::config(format!(
                "VAD only supports 8000, 16000, 32000, or 48000 Hz, got {}",
                self.sample_rate
            )));
        }
        if !matches!(self.frame_ms, 10 | 20 | 30) {
            return Err(VoiceError::config(format!(
                "VAD frames must be 10, 20 or 30 ms, got {}",
                self.frame_ms
            )));
        }
        if self.mode > 3 {
            return Err(VoiceError::config(format!("VAD mode must be 0-3, got {}", self.mode)));
        }
        Ok(())
    }
}

/// Silence-gap turn detection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Silence after speech that commits a turn.
    pub min_silence_ms: u32,
    /// Shorter bursts are discarded as noise.
    pub min_speech_ms: u32,
    /// Turns are force-committed at this length.
    pub max_turn_ms: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self { min_silence_ms: 500, min_speech_ms: 200, max_turn_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseCancellation {
    Off,
    /// Zero out frames below the noise floor.
    #[default]
    Gate,
}

/// How inbound room audio is treated before the VAD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomInputOptions {
    pub noise_cancellation: NoiseCancellation,
    /// RMS level below which the gate silences a frame.
    pub noise_floor: f32,
}

impl Default for RoomInputOptions {
    fn default() -> Self {
        Self { noise_cancellation: NoiseCancellation::Gate, noise_floor: 0.01 }
    }
}

impl RoomInputOptions {
    #[must_use]
    pub fn with_noise_cancellation(mut self, noise_cancellation: NoiseCancellation) -> Self {
        self.noise_cancellation = noise_cancellation;
        self
    }

    #[must_use]
    pub fn with_noise_floor(mut self, noise_floor: f32) -> Self {
        self.noise_floor = noise_floor;
        self
    }
}

/// Everything an [`AgentSession`](crate::AgentSession) needs besides its
/// adapters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub stt: SttConfig,
    pub tts: TtsConfig,
    /// Chat model used by the agent.
    pub llm_model: LlmModel,
    pub vad: VadConfig,
    pub turn: TurnConfig,
    pub input: RoomInputOptions,
}

/// Newtype so the default model name lives in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmModel(pub String);

impl Default for LlmModel {
    fn default() -> Self {
        Self("gpt-4o-mini".to_string())
    }
}

impl LlmModel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stt(mut self, stt: SttConfig) -> Self {
        self.stt = stt;
        self
    }

    #[must_use]
    pub fn with_tts(mut self, tts: TtsConfig) -> Self {
        self.tts = tts;
        self
    }

    #[must_use]
    pub fn with_llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = LlmModel(model.into());
        self
    }

    #[must_use]
    pub fn with_vad(mut self, vad: VadConfig) -> Self {
        self.vad = vad;
        self
    }

    #[must_use]
    pub fn with_turn(mut self, turn: TurnConfig) -> Self {
        self.turn = turn;
        self
    }

    #[must_use]
    pub fn with_input(mut self, input: RoomInputOptions) -> Self {
        self.input = input;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.vad.validate()?;
        // Rooms deliver inbound audio at one fixed rate.
        if self.vad.sample_rate != INPUT_SAMPLE_RATE {
            return Err(VoiceError::config(format!(
                "vad.sample_rate must be {INPUT_SAMPLE_RATE} Hz to match room audio, got {}",
                self.vad.sample_rate
            )));
        }
        if self.turn.min_silence_ms == 0 {
            return Err(VoiceError::config("turn.min_silence_ms must be positive"));
        }
        if self.turn.max_turn_ms < self.turn.min_speech_ms {
            return Err(VoiceError::config("turn.max_turn_ms is shorter than turn.min_speech_ms"));
        }
        if self.tts.sample_rate == 0 {
            return Err(VoiceError::config("tts.sample_rate must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_pipeline() {
        let config = SessionConfig::default();
        assert_eq!(config.stt.model, "nova-3");
        assert_eq!(config.stt.language, "en");
        assert_eq!(config.tts.effective_model(), "aura-asteria-en");
        assert_eq!(config.llm_model.as_str(), "gpt-4o-mini");
        assert_eq!(config.vad.frame_len(), 480);
        assert_eq!(config.input.noise_cancellation, NoiseCancellation::Gate);
        config.validate().unwrap();
    }

    #[test]
    fn voice_overrides_model() {
        let tts = TtsConfig { voice: Some("aura-luna-en".into()), ..Default::default() };
        assert_eq!(tts.effective_model(), "aura-luna-en");
    }

    #[test]
    fn invalid_vad_settings_are_rejected() {
        let bad_rate = VadConfig { sample_rate: 44_100, ..Default::default() };
        assert!(bad_rate.validate().is_err());
        let bad_frame = VadConfig { frame_ms: 25, ..Default::default() };
        assert!(bad_frame.validate().is_err());
        let bad_mode = VadConfig { mode: 7, ..Default::default() };
        assert!(bad_mode.validate().is_err());
    }

    #[test]
    fn vad_rate_must_match_room_audio() {
        let vad = VadConfig { sample_rate: 48_000, ..VadConfig::energy(0.05) };
        assert!(vad.validate().is_ok());
        let err = SessionConfig::default().with_vad(vad).validate().unwrap_err();
        assert!(matches!(err, VoiceError::Config(msg) if msg.contains("16000")));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"tts":{"voice":"aura-orion-en"},"turn":{"min_silence_ms":800}}"#)
                .unwrap();
        assert_eq!(config.tts.effective_model(), "aura-orion-en");
        assert_eq!(config.turn.min_silence_ms, 800);
        assert_eq!(config.turn.min_speech_ms, 200);
        assert_eq!(config.stt.model, "nova-3");
    }
}
