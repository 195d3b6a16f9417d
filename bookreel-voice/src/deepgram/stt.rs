use super::{DeepgramConfig, http_client};
use crate::audio::AudioFrame;
use crate::config::SttConfig;
use crate::error::{Result, VoiceError};
use crate::stt::{SpeechToText, Transcript};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::Instrument;

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
    #[serde(default)]
    detected_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Pre-recorded transcription via `POST /v1/listen`.
pub struct DeepgramStt {
    client: reqwest::Client,
    config: DeepgramConfig,
    stt: SttConfig,
}

impl DeepgramStt {
    pub fn new(config: DeepgramConfig, stt: SttConfig) -> Result<Self> {
        let client = http_client()
            .map_err(|e| VoiceError::Stt(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config, stt })
    }

    async fn listen(&self, audio: &AudioFrame) -> Result<Transcript> {
        let sample_rate = audio.format.sample_rate.to_string();
        let channels = audio.format.channels.to_string();
        let response = self
            .client
            .post(self.config.endpoint("/v1/listen"))
            .header("Authorization", self.config.authorization())
            .header("Content-Type", "application/octet-stream")
            .query(&[
                ("model", self.stt.model.as_str()),
                ("language", self.stt.language.as_str()),
                ("encoding", "linear16"),
                ("sample_rate", sample_rate.as_str()),
                ("channels", channels.as_str()),
                ("smart_format", "true"),
            ])
            .body(audio.to_le_bytes())
            .send()
            .await
            .map_err(|e| VoiceError::Stt(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Stt(format!("Deepgram listen error ({status}): {body}")));
        }

        let body: ListenResponse = response
            .json()
            .await
            .map_err(|e| VoiceError::Stt(format!("invalid listen response: {e}")))?;

        let channel = body.results.channels.into_iter().next();
        let language = channel
            .as_ref()
            .and_then(|c| c.detected_language.clone())
            .unwrap_or_else(|| self.stt.language.clone());
        let best = channel.and_then(|c| c.alternatives.into_iter().next());

        let mut transcript = Transcript::new(
            best.as_ref().map(|a| a.transcript.trim().to_string()).unwrap_or_default(),
        )
        .with_language(language);
        transcript.confidence = best.and_then(|a| a.confidence);
        Ok(transcript)
    }
}

#[async_trait]
impl SpeechToText for DeepgramStt {
    fn name(&self) -> &str {
        &self.stt.model
    }

    async fn transcribe(&self, audio: &AudioFrame) -> Result<Transcript> {
        if audio.is_empty() {
            return Ok(Transcript::new("").with_language(self.stt.language.clone()));
        }
        let span = bookreel_telemetry::speech_call_span("stt", &self.stt.model);
        let transcript = self.listen(audio).instrument(span).await?;
        tracing::debug!(
            text = %transcript.text,
            confidence = ?transcript.confidence,
            "transcribed turn"
        );
        Ok(transcript)
    }
}
