//! Mock AI provider for testing.
//!
//! Returns pre-scripted responses in order, supports error injection and
//! simulated latency, and records every request for verification.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::ports::{AiError, AiProvider, ChatRequest, ChatResponse, ProviderInfo, TokenUsage};

/// A scripted mock reply.
#[derive(Debug)]
enum ScriptedReply {
    Success(String),
    Error(MockError),
}

/// Error kinds the mock can inject.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited,
    Unavailable(String),
    Network(String),
    Timeout(Duration),
}

impl From<MockError> for AiError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited => AiError::RateLimited {
                retry_after: Some(Duration::from_secs(30)),
            },
            MockError::Unavailable(msg) => AiError::Unavailable(msg),
            MockError::Network(msg) => AiError::Network(msg),
            MockError::Timeout(d) => AiError::Timeout(d),
        }
    }
}

/// Configurable mock implementation of [`AiProvider`].
///
/// When the script runs out, further calls return a fixed default reply.
#[derive(Debug, Clone, Default)]
pub struct MockAiProvider {
    script: Arc<Mutex<VecDeque<ScriptedReply>>>,
    calls: Arc<Mutex<Vec<ChatRequest>>>,
    delay: Duration,
}

impl MockAiProvider {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Success(content.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: MockError) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All recorded requests, in call order.
    pub fn recorded_calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AiError> {
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(ScriptedReply::Success(content)) => Ok(ChatResponse {
                content,
                model: "mock-model".to_string(),
                usage: TokenUsage::default(),
            }),
            Some(ScriptedReply::Error(err)) => Err(err.into()),
            None => Ok(ChatResponse {
                content: "Mock response".to_string(),
                model: "mock-model".to_string(),
                usage: TokenUsage::default(),
            }),
        }
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "mock".to_string(),
            chat_model: "mock-model".to_string(),
            extraction_model: "mock-model".to_string(),
        }
    }
}
