//! Text-to-speech capability.

use crate::audio::AudioFrame;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    fn name(&self) -> &str;

    /// Sample rate of the frames [`synthesize`](Self::synthesize) returns.
    fn sample_rate(&self) -> u32;

    /// Synthesize `text`. `language` is a hint; voices that only speak one
    /// language ignore it.
    async fn synthesize(&self, text: &str, language: Option<&str>) -> Result<AudioFrame>;
}
