//! Span helpers for session, model, and tool operations.

use tracing::Span;

/// Span covering one job: a room connection and its session.
///
/// # Example
/// ```
/// use bookreel_telemetry::session_span;
/// let span = session_span("living-room", "job-1");
/// let _enter = span.enter();
/// ```
pub fn session_span(room: &str, job_id: &str) -> Span {
    tracing::info_span!("session", room.name = room, job.id = job_id, otel.kind = "server")
}

/// Span for one committed user turn.
pub fn turn_span(session_id: &str, turn: u64) -> Span {
    tracing::info_span!("session.turn", session.id = session_id, turn.index = turn)
}

/// Span for language model calls.
///
/// # Example
/// ```
/// use bookreel_telemetry::model_call_span;
/// let span = model_call_span("gpt-4o-mini");
/// let _enter = span.enter();
/// ```
pub fn model_call_span(model_name: &str) -> Span {
    tracing::info_span!("model.call", model.name = model_name, otel.kind = "client")
}

/// Span for tool execution.
pub fn tool_execute_span(tool_name: &str) -> Span {
    tracing::info_span!("tool.execute", tool.name = tool_name, otel.kind = "internal")
}

/// Span for speech capability calls (`stt` or `tts`).
pub fn speech_call_span(kind: &'static str, model: &str) -> Span {
    tracing::debug_span!("speech.call", speech.kind = kind, model.name = model, otel.kind = "client")
}
