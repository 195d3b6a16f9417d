//! # bookreel-core
//!
//! Shared traits and types for the bookreel assistant: the error type, model and
//! tool traits, the conversational [`Agent`] trait, and the recommendation
//! domain ([`Category`], [`Genre`], [`Command`]).

pub mod agent;
pub mod error;
pub mod model;
pub mod recommendation;
pub mod tool;
pub mod types;

pub use agent::{Agent, Reply, Utterance};
pub use error::{BookreelError, Result};
pub use model::{
    FinishReason, GenerateContentConfig, Llm, LlmExt, LlmRequest, LlmResponse, LlmResponseStream,
    UsageMetadata,
};
pub use recommendation::{
    Category, Command, Genre, RecommendationRequest, RecommendationResult, UnknownCategory,
};
pub use tool::{Tool, ToolContext};
pub use types::{Content, Part};
