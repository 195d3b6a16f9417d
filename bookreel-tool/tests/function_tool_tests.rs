use bookreel_core::{BookreelError, Result, Tool, ToolContext};
use bookreel_model::MockLlm;
use bookreel_tool::{CallContext, FunctionTool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

fn ctx() -> Arc<dyn ToolContext> {
    Arc::new(CallContext::new("session-1", "call-1", Arc::new(MockLlm::new("mock"))))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[allow(dead_code)]
struct SearchParams {
    genre: String,
    limit: u8,
}

#[tokio::test]
async fn test_function_tool_basic() {
    let tool = FunctionTool::new("shout", "Upper-cases a genre", |_ctx, args| async move {
        let genre = args["genre"].as_str().unwrap_or_default().to_uppercase();
        Ok(json!(genre))
    });

    assert_eq!(tool.name(), "shout");
    assert_eq!(tool.description(), "Upper-cases a genre");
    assert!(tool.parameters_schema().is_none());

    let result = tool.execute(ctx(), json!({"genre": "noir"})).await.unwrap();
    assert_eq!(result, json!("NOIR"));
}

#[tokio::test]
async fn test_function_tool_with_schema() {
    let tool = FunctionTool::new("search", "Search", |_ctx, _args| async move { Ok(json!([])) })
        .with_parameters_schema::<SearchParams>();

    let schema = tool.parameters_schema().unwrap();
    assert_eq!(schema["properties"]["genre"]["type"], "string");
    assert!(schema["properties"]["limit"].is_object());
    let required: Vec<&str> =
        schema["required"].as_array().unwrap().iter().filter_map(|v| v.as_str()).collect();
    assert!(required.contains(&"genre"));
}

#[tokio::test]
async fn test_function_tool_sees_context() {
    let tool = FunctionTool::new("who", "Reports the call id", |ctx, _args| async move {
        Ok(json!({"session": ctx.session_id(), "call": ctx.function_call_id()}))
    });
    let result = tool.execute(ctx(), json!({})).await.unwrap();
    assert_eq!(result, json!({"session": "session-1", "call": "call-1"}));
}

#[tokio::test]
async fn test_function_tool_error() {
    let tool = FunctionTool::new("fail", "Always fails", |_ctx, _args| async move {
        Err::<serde_json::Value, _>(BookreelError::Tool("intentional error".to_string()))
    });
    let result: Result<_> = tool.execute(ctx(), json!({})).await;
    assert!(matches!(result, Err(BookreelError::Tool(_))));
}
