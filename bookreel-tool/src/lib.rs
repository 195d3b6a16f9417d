//! # bookreel-tool
//!
//! Tools the assistant can call:
//!
//! - [`FunctionTool`] - wrap an async function as a [`Tool`]
//! - [`recommend_books`] / [`recommend_movies`] - ask the model for three titles
//! - [`ToolRegistry`] - name lookup and [`Command`](bookreel_core::Command) dispatch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bookreel_core::{Category, RecommendationRequest};
//! use bookreel_tool::recommend::lookup;
//! # async fn run(model: &dyn bookreel_core::Llm) -> bookreel_core::Result<()> {
//! let result = lookup(model, &RecommendationRequest::new(Category::Book, "fantasy")).await?;
//! println!("{:?}", result.titles);
//! # Ok(())
//! # }
//! ```

mod context;
mod function_tool;
pub mod recommend;
mod toolset;

pub use bookreel_core::{Tool, ToolContext};
pub use context::CallContext;
pub use function_tool::FunctionTool;
pub use recommend::{build_prompt, lookup, parse_titles, recommend_books, recommend_movies};
pub use toolset::ToolRegistry;
