use bookreel_core::{Llm, ToolContext};
use std::sync::Arc;

/// Plain [`ToolContext`] for one tool call.
#[derive(Clone)]
pub struct CallContext {
    session_id: String,
    function_call_id: String,
    model: Arc<dyn Llm>,
}

impl CallContext {
    pub fn new(
        session_id: impl Into<String>,
        function_call_id: impl Into<String>,
        model: Arc<dyn Llm>,
    ) -> Self {
        Self { session_id: session_id.into(), function_call_id: function_call_id.into(), model }
    }
}

impl ToolContext for CallContext {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn function_call_id(&self) -> &str {
        &self.function_call_id
    }

    fn model(&self) -> Arc<dyn Llm> {
        Arc::clone(&self.model)
    }
}
