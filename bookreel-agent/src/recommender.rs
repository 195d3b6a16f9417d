use crate::compose::{compose_reply, localize};
use crate::extraction::{self, Extraction};
use crate::instructions::{GREETING, Line, RECOMMENDER_INSTRUCTIONS};
use crate::policy::{Action, Policy, PolicyOptions, PolicyState};
use bookreel_core::{
    Agent, BookreelError, Command, Llm, RecommendationResult, Reply, Result, Utterance,
};
use bookreel_tool::{CallContext, ToolRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::Instrument;

pub const DEFAULT_NAME: &str = "book_movie_recommender";

/// Per-session conversation: where the policy is and what language the
/// user last spoke.
struct Conversation {
    policy: Policy,
    language: Option<String>,
}

/// Book and movie recommender driven by [`Policy`].
///
/// The model is used for extraction, recommendation lookups, and composing
/// replies. It never decides what happens next.
pub struct RecommenderAgent {
    name: String,
    description: String,
    session_id: String,
    model: Arc<dyn Llm>,
    tools: ToolRegistry,
    conversation: Mutex<Conversation>,
    turns: AtomicU64,
}

impl std::fmt::Debug for RecommenderAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommenderAgent")
            .field("name", &self.name)
            .field("session_id", &self.session_id)
            .field("model", &self.model.name())
            .field("tools", &self.tools.names())
            .finish()
    }
}

pub struct RecommenderAgentBuilder {
    name: String,
    description: Option<String>,
    session_id: Option<String>,
    model: Option<Arc<dyn Llm>>,
    tools: Option<ToolRegistry>,
    options: PolicyOptions,
}

impl RecommenderAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            session_id: None,
            model: None,
            tools: None,
            options: PolicyOptions::default(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn model(mut self, model: Arc<dyn Llm>) -> Self {
        self.model = Some(model);
        self
    }

    /// Defaults to [`ToolRegistry::recommendations`].
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn options(mut self, options: PolicyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<RecommenderAgent> {
        let model =
            self.model.ok_or_else(|| BookreelError::Agent("Model is required".to_string()))?;

        Ok(RecommenderAgent {
            name: self.name,
            description: self
                .description
                .unwrap_or_else(|| "Recommends books or movies by genre".to_string()),
            session_id: self.session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            model,
            tools: self.tools.unwrap_or_else(ToolRegistry::recommendations),
            conversation: Mutex::new(Conversation {
                policy: Policy::new(self.options),
                language: None,
            }),
            turns: AtomicU64::new(0),
        })
    }
}

impl RecommenderAgent {
    pub fn builder() -> RecommenderAgentBuilder {
        RecommenderAgentBuilder::new(DEFAULT_NAME)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn instructions(&self) -> &'static str {
        RECOMMENDER_INSTRUCTIONS
    }

    /// Snapshot of the policy state.
    pub async fn state(&self) -> PolicyState {
        self.conversation.lock().await.policy.state().clone()
    }

    fn reply_language(conversation: &Conversation) -> Option<String> {
        if conversation.policy.options().mirror_language {
            conversation.language.clone()
        } else {
            None
        }
    }

    async fn speak(&self, conversation: &Conversation, line: Line) -> Result<String> {
        let language = Self::reply_language(conversation);
        localize(self.model.as_ref(), &line.text(), language.as_deref()).await
    }

    async fn recommend(&self, conversation: &mut Conversation, command: Command) -> Result<String> {
        let ctx = Arc::new(CallContext::new(
            self.session_id.clone(),
            uuid::Uuid::new_v4().to_string(),
            Arc::clone(&self.model),
        ));

        let result = match self.tools.dispatch(ctx, &command).await.and_then(|output| {
            RecommendationResult::from_tool_output(command.category(), &output)
        }) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, tool = command.tool_name(), "recommendation lookup failed");
                conversation.policy.on_lookup_failed();
                return Err(e);
            }
        };

        let follow_up = conversation.policy.on_lookup_complete();
        let language = Self::reply_language(conversation);
        let mut text =
            compose_reply(self.model.as_ref(), &result, command.genre(), language.as_deref())
                .await?;
        if let Some(line) = follow_up {
            let line = self.speak(conversation, line).await?;
            text.push(' ');
            text.push_str(&line);
        }
        Ok(text)
    }

    async fn handle_turn(&self, utterance: &Utterance) -> Result<Reply> {
        let mut conversation = self.conversation.lock().await;
        if let Some(language) = utterance.language.as_deref().filter(|l| !l.trim().is_empty()) {
            conversation.language = Some(language.to_string());
        }

        if matches!(conversation.policy.state(), PolicyState::Start) {
            conversation.policy.greet();
        }

        // Nothing the user says changes a finished conversation.
        let done = matches!(conversation.policy.state(), PolicyState::Done);
        let text = utterance.text.trim();
        let heard: Option<Extraction> = if text.is_empty() || done {
            None
        } else {
            extraction::extract(self.model.as_ref(), conversation.policy.state(), text).await?
        };
        if let Some(language) = heard.as_ref().and_then(Extraction::language) {
            conversation.language = Some(language.to_string());
        }

        let text = match conversation.policy.on_input(heard.as_ref()) {
            Action::Say(line) => self.speak(&conversation, line).await?,
            Action::Lookup(command) => self.recommend(&mut conversation, command).await?,
        };
        tracing::debug!(state = conversation.policy.state().name(), "turn handled");
        Ok(Reply::new(text).with_language(Self::reply_language(&conversation)))
    }
}

#[async_trait]
impl Agent for RecommenderAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    /// Speak `instructions` as-is, or the greeting when they are blank.
    /// The first call also moves the policy out of its start state.
    async fn generate_reply(&self, instructions: &str) -> Result<Reply> {
        let mut conversation = self.conversation.lock().await;
        if matches!(conversation.policy.state(), PolicyState::Start) {
            conversation.policy.greet();
        }
        let text = if instructions.trim().is_empty() { GREETING } else { instructions };
        let language = Self::reply_language(&conversation);
        let text = localize(self.model.as_ref(), text, language.as_deref()).await?;
        Ok(Reply::new(text).with_language(language))
    }

    async fn on_user_turn(&self, utterance: &Utterance) -> Result<Reply> {
        let turn = self.turns.fetch_add(1, Ordering::Relaxed) + 1;
        let span = bookreel_telemetry::turn_span(&self.session_id, turn);
        self.handle_turn(utterance).instrument(span).await
    }
}
