use crate::{Llm, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Option<Value> {
        None
    }
    async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value>;
}

/// What a tool can see of the session invoking it.
pub trait ToolContext: Send + Sync {
    fn session_id(&self) -> &str;
    fn function_call_id(&self) -> &str;
    /// Language model the tool may call for its own work.
    fn model(&self) -> Arc<dyn Llm>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmRequest, LlmResponseStream};

    struct NoModel;

    #[async_trait]
    impl Llm for NoModel {
        fn name(&self) -> &str {
            "none"
        }
        async fn generate_content(&self, _req: LlmRequest, _stream: bool) -> Result<LlmResponseStream> {
            Ok(Box::pin(futures::stream::empty()))
        }
    }

    struct TestContext;

    impl ToolContext for TestContext {
        fn session_id(&self) -> &str {
            "session"
        }
        fn function_call_id(&self) -> &str {
            "call-123"
        }
        fn model(&self) -> Arc<dyn Llm> {
            Arc::new(NoModel)
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes its arguments"
        }

        async fn execute(&self, ctx: Arc<dyn ToolContext>, args: Value) -> Result<Value> {
            Ok(serde_json::json!({ "call": ctx.function_call_id(), "args": args }))
        }
    }

    #[tokio::test]
    async fn test_tool_execute() {
        let tool = EchoTool;
        assert!(tool.parameters_schema().is_none());
        let ctx = Arc::new(TestContext) as Arc<dyn ToolContext>;
        let result = tool.execute(ctx, serde_json::json!({"genre": "noir"})).await.unwrap();
        assert_eq!(result["call"], "call-123");
        assert_eq!(result["args"]["genre"], "noir");
    }
}
