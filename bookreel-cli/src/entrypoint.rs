//! Per-room job body and the clients it shares with other jobs.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use bookreel_agent::{GREETING, PolicyOptions, RecommenderAgent};
use bookreel_core::Llm;
use bookreel_model::{OpenAIClient, OpenAIConfig};
use bookreel_voice::{
    AgentSession, DeepgramConfig, DeepgramStt, DeepgramTts, JobContext, SessionConfig,
    SpeechToText, TextToSpeech,
};
use std::sync::Arc;
use tracing::info;

/// Clients and settings shared by every job in one worker.
#[derive(Clone)]
pub struct Services {
    pub model: Arc<dyn Llm>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub session: SessionConfig,
    pub policy: PolicyOptions,
}

/// OpenAI chat client from the loaded configuration.
pub fn openai_model(config: &AppConfig) -> Result<Arc<dyn Llm>> {
    let mut openai = OpenAIConfig::new(
        config.secrets.openai_api_key.clone(),
        config.settings.session.llm_model.as_str(),
    );
    if let Some(base_url) = &config.secrets.openai_base_url {
        openai = openai.with_base_url(base_url.clone());
    }
    if let Some(max_tokens) = config.settings.model.max_tokens {
        openai = openai.with_max_tokens(max_tokens);
    }
    let client =
        OpenAIClient::new(openai)?.with_retry_config(config.settings.model.retry_config());
    Ok(Arc::new(client))
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let deepgram = config
            .secrets
            .deepgram
            .as_ref()
            .context("DEEPGRAM_API_KEY is required for voice sessions")?;
        let mut dg = DeepgramConfig::new(deepgram.api_key.clone());
        if let Some(base_url) = &deepgram.base_url {
            dg = dg.with_base_url(base_url.clone());
        }

        let session = config.settings.session.clone();
        let stt = DeepgramStt::new(dg.clone(), session.stt.clone())?;
        let tts = DeepgramTts::new(dg, session.tts.clone())?;
        Ok(Self {
            model: openai_model(config)?,
            stt: Arc::new(stt),
            tts: Arc::new(tts),
            session,
            policy: config.settings.policy.clone(),
        })
    }
}

/// Join the job's room, greet, then converse until the room closes.
pub async fn entrypoint(ctx: JobContext, services: Arc<Services>) -> bookreel_voice::Result<()> {
    let room = ctx.connect().await?;
    let session = AgentSession::builder(services.session.clone())
        .stt(Arc::clone(&services.stt))
        .tts(Arc::clone(&services.tts))
        .build()?;

    let agent = RecommenderAgent::builder()
        .session_id(session.id())
        .model(Arc::clone(&services.model))
        .options(services.policy.clone())
        .build()?;

    session.start(room, Arc::new(agent), services.session.input.clone()).await?;
    session.generate_reply(GREETING).await?;
    info!(room = ctx.room_name(), session.id = session.id(), "greeted participant");
    session.wait().await
}
