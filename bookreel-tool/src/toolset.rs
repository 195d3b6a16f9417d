use crate::recommend::{recommend_books, recommend_movies};
use bookreel_core::{BookreelError, Command, Result, Tool, ToolContext};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tools addressable by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `recommend_books` and `recommend_movies`.
    pub fn recommendations() -> Self {
        Self::new().with_tool(Arc::new(recommend_books())).with_tool(Arc::new(recommend_movies()))
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Validate `command` and run the tool it names.
    pub async fn dispatch(&self, ctx: Arc<dyn ToolContext>, command: &Command) -> Result<Value> {
        command.validate()?;
        let tool = self.get(command.tool_name()).ok_or_else(|| {
            BookreelError::Tool(format!("no tool registered as '{}'", command.tool_name()))
        })?;
        tracing::debug!(tool = tool.name(), call.id = ctx.function_call_id(), "dispatching command");
        tool.execute(ctx, command.tool_args()).await
    }
}
