//! Deepgram speech adapters over its REST API.

mod stt;
mod tts;

pub use stt::DeepgramStt;
pub use tts::DeepgramTts;

pub const DEEPGRAM_API_BASE: &str = "https://api.deepgram.com";

/// Credentials and endpoint shared by both adapters.
#[derive(Clone)]
pub struct DeepgramConfig {
    pub api_key: String,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for DeepgramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepgramConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DeepgramConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: None }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_deref().unwrap_or(DEEPGRAM_API_BASE);
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Token {}", self.api_key)
    }
}

pub(crate) fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().build()
}
