//! # bookreel-model
//!
//! Language model integrations.
//!
//! - [`OpenAIClient`] - OpenAI chat completions (default model `gpt-4o-mini`)
//! - [`MockLlm`] - scripted model for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bookreel_model::{OpenAIClient, OpenAIConfig};
//!
//! let api_key = std::env::var("OPENAI_API_KEY").unwrap();
//! let model = OpenAIClient::new(OpenAIConfig::new(api_key, "gpt-4o-mini")).unwrap();
//! ```

pub mod mock;
pub mod openai;
pub mod retry;

pub use mock::MockLlm;
pub use openai::{OpenAIClient, OpenAIConfig};
pub use retry::RetryConfig;
