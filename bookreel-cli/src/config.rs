//! Startup configuration: secrets from the environment, tunables from an
//! optional TOML file.

use anyhow::{Context, Result, bail};
use bookreel_agent::PolicyOptions;
use bookreel_model::RetryConfig;
use bookreel_voice::{SessionConfig, WorkerOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which external services the chosen command talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// LiveKit rooms with Deepgram speech.
    Voice,
    /// Text only.
    Console,
}

/// Model client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Retries for transient OpenAI failures. Unset disables retrying.
    pub max_retries: Option<u32>,
    pub max_tokens: Option<u32>,
}

impl ModelSettings {
    pub fn retry_config(&self) -> RetryConfig {
        match self.max_retries {
            Some(retries) if retries > 0 => RetryConfig::default().with_max_retries(retries),
            _ => RetryConfig::disabled(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub max_concurrent_jobs: usize,
    pub agent_identity: String,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        let options = WorkerOptions::default();
        Self { max_concurrent_jobs: options.max_concurrent_jobs, agent_identity: options.agent_identity }
    }
}

impl WorkerSettings {
    pub fn to_options(&self) -> WorkerOptions {
        WorkerOptions::default()
            .with_max_concurrent_jobs(self.max_concurrent_jobs)
            .with_agent_identity(self.agent_identity.clone())
    }
}

/// Contents of the `--config` file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionConfig,
    pub policy: PolicyOptions,
    pub model: ModelSettings,
    pub worker: WorkerSettings,
}

impl Settings {
    pub fn from_toml(source: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(source).context("invalid settings file")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&source).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        if self.policy.max_attempts == 0 {
            bail!("policy.max_attempts must be at least 1");
        }
        if self.worker.max_concurrent_jobs == 0 {
            bail!("worker.max_concurrent_jobs must be at least 1");
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct DeepgramSecrets {
    pub api_key: String,
    pub base_url: Option<String>,
}

#[derive(Clone)]
pub struct LiveKitSecrets {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Credentials read from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    /// Present in [`Mode::Voice`].
    pub deepgram: Option<DeepgramSecrets>,
    /// Present in [`Mode::Voice`].
    pub livekit: Option<LiveKitSecrets>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &"[REDACTED]")
            .field("openai_base_url", &self.openai_base_url)
            .field("deepgram", &self.deepgram.as_ref().map(|d| (&"[REDACTED]", &d.base_url)))
            .field("livekit", &self.livekit.as_ref().map(|l| (&l.url, &l.api_key, &"[REDACTED]")))
            .finish()
    }
}

impl Secrets {
    /// Read credentials through `lookup`. Blank values count as missing; all
    /// missing names are reported together.
    pub fn from_lookup(mode: Mode, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut missing = Vec::new();
        let mut require = |name: &'static str| {
            let value = read(name);
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };

        let openai_api_key = require("OPENAI_API_KEY");
        let voice = match mode {
            Mode::Voice => Some((
                require("DEEPGRAM_API_KEY"),
                LiveKitSecrets {
                    url: require("LIVEKIT_URL"),
                    api_key: require("LIVEKIT_API_KEY"),
                    api_secret: require("LIVEKIT_API_SECRET"),
                },
            )),
            Mode::Console => None,
        };

        if !missing.is_empty() {
            bail!("missing required environment variables: {}", missing.join(", "));
        }

        let (deepgram, livekit) = match voice {
            Some((api_key, livekit)) => (
                Some(DeepgramSecrets { api_key, base_url: read("DEEPGRAM_BASE_URL") }),
                Some(livekit),
            ),
            None => (None, None),
        };

        Ok(Self { openai_api_key, openai_base_url: read("OPENAI_BASE_URL"), deepgram, livekit })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secrets: Secrets,
    pub settings: Settings,
}

impl AppConfig {
    /// Load `.env` (if present), then the process environment, then the
    /// optional settings file.
    pub fn load(mode: Mode, settings_path: Option<&Path>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("failed to read .env");
            }
        }
        let secrets = Secrets::from_lookup(mode, |name| std::env::var(name).ok())?;
        let settings = match settings_path {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        Ok(Self { secrets, settings })
    }
}
