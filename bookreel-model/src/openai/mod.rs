//! OpenAI provider.
//!
//! Chat completions over HTTP, with optional structured output via
//! `response_format: json_schema`. Any OpenAI-compatible server works through
//! [`OpenAIConfig::with_base_url`].

mod client;
mod config;
pub(crate) mod convert;

pub use client::OpenAIClient;
pub use config::{DEFAULT_MODEL, OPENAI_API_BASE, OpenAIConfig};
