use super::{DeepgramConfig, http_client};
use crate::audio::{AudioFormat, AudioFrame};
use crate::config::TtsConfig;
use crate::error::{Result, VoiceError};
use crate::tts::TextToSpeech;
use async_trait::async_trait;
use serde_json::json;
use tracing::Instrument;

/// Synthesis via `POST /v1/speak`, returning raw linear16 audio.
pub struct DeepgramTts {
    client: reqwest::Client,
    config: DeepgramConfig,
    tts: TtsConfig,
}

impl DeepgramTts {
    pub fn new(config: DeepgramConfig, tts: TtsConfig) -> Result<Self> {
        let client = http_client()
            .map_err(|e| VoiceError::Tts(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config, tts })
    }

    async fn speak(&self, text: &str) -> Result<AudioFrame> {
        let sample_rate = self.tts.sample_rate.to_string();
        let response = self
            .client
            .post(self.config.endpoint("/v1/speak"))
            .header("Authorization", self.config.authorization())
            .query(&[
                ("model", self.tts.effective_model()),
                ("encoding", "linear16"),
                ("sample_rate", sample_rate.as_str()),
                ("container", "none"),
            ])
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| VoiceError::Tts(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Tts(format!("Deepgram speak error ({status}): {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VoiceError::Tts(format!("failed to read audio: {e}")))?;
        AudioFrame::from_le_bytes(&bytes, AudioFormat::mono(self.tts.sample_rate))
    }
}

#[async_trait]
impl TextToSpeech for DeepgramTts {
    fn name(&self) -> &str {
        self.tts.effective_model()
    }

    fn sample_rate(&self) -> u32 {
        self.tts.sample_rate
    }

    async fn synthesize(&self, text: &str, language: Option<&str>) -> Result<AudioFrame> {
        if let Some(language) = language.filter(|l| !l.starts_with("en")) {
            tracing::debug!(language, model = self.tts.effective_model(), "voice may not cover language");
        }
        let span = bookreel_telemetry::speech_call_span("tts", self.tts.effective_model());
        self.speak(text).instrument(span).await
    }
}
