//! Speech-to-text capability.

use crate::audio::AudioFrame;
use crate::error::Result;
use async_trait::async_trait;

/// Recognized text for one committed turn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcript {
    pub text: String,
    /// Language reported or configured for the recognition.
    pub language: Option<String>,
    pub confidence: Option<f32>,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    fn name(&self) -> &str;

    async fn transcribe(&self, audio: &AudioFrame) -> Result<Transcript>;
}
