//! # bookreel-agent
//!
//! The recommender conversation:
//!
//! - [`Policy`] - explicit state machine for category, genre, retries and follow-up
//! - [`extraction`] - structured model call that reads category and genre from a turn
//! - [`compose`] - spoken replies built from lookup results
//! - [`RecommenderAgent`] - [`Agent`](bookreel_core::Agent) tying the pieces together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bookreel_agent::RecommenderAgent;
//! use bookreel_core::{Agent, Utterance};
//! # async fn run(model: std::sync::Arc<dyn bookreel_core::Llm>) -> bookreel_core::Result<()> {
//! let agent = RecommenderAgent::builder().model(model).build()?;
//! let greeting = agent.generate_reply("").await?;
//! let reply = agent.on_user_turn(&Utterance::new("A book, please")).await?;
//! println!("{}\n{}", greeting.text, reply.text);
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod extraction;
pub mod instructions;
pub mod policy;
mod recommender;

pub use extraction::{CategoryChoice, Extraction};
pub use instructions::{GREETING, Line, RECOMMENDER_INSTRUCTIONS, UNRECOGNIZED_GENRE};
pub use policy::{Action, FollowUp, Policy, PolicyOptions, PolicyState};
pub use recommender::{DEFAULT_NAME, RecommenderAgent, RecommenderAgentBuilder};
