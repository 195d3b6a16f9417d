use bookreel_core::{BookreelError, Content, Llm, LlmRequest, LlmResponse, LlmResponseStream, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Responder = Arc<dyn Fn(&LlmRequest) -> Result<String> + Send + Sync>;

/// Scripted model for tests.
///
/// Queued replies are returned one per call, in order. When the queue is empty
/// the responder (if any) answers; otherwise the call fails.
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<Result<String>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    pub fn with_error(self, error: BookreelError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&LlmRequest) -> Result<String> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    fn push(&self, reply: Result<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_content(&self, req: LlmRequest, _stream: bool) -> Result<LlmResponseStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let text = match (scripted, &self.responder) {
            (Some(reply), _) => reply?,
            (None, Some(responder)) => responder(&req)?,
            (None, None) => {
                return Err(BookreelError::Model(format!("{}: no scripted reply left", self.name)));
            }
        };

        let response = LlmResponse::new(Content::new("model").with_text(text));
        let stream = async_stream::stream! {
            yield Ok(response);
        };
        Ok(Box::pin(stream))
    }
}
