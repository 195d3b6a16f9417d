use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A finished user turn as recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    /// BCP-47 tag reported by speech recognition, when known.
    pub language: Option<String>,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), language: None }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// What the agent wants spoken next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub language: Option<String>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), language: None }
    }

    #[must_use]
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

/// A conversational agent driven one turn at a time.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Proactive utterance, e.g. the opening greeting.
    async fn generate_reply(&self, instructions: &str) -> Result<Reply>;

    /// Respond to one user turn.
    async fn on_user_turn(&self, utterance: &Utterance) -> Result<Reply>;
}
