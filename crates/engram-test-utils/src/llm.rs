//! Scripted model clients for tests.

use async_trait::async_trait;
use engram_core::llm::{CompletionRequest, ModelClient, ModelError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Model that always returns the same reply.
#[derive(Debug, Clone)]
pub struct FixedModel {
    reply: String,
}

impl FixedModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl ModelClient for FixedModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ModelError> {
        Ok(self.reply.clone())
    }
}

/// Model that pops scripted replies and fails once the script is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ModelError> {
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| ModelError::Transport("script exhausted".to_string()))
    }
}

/// Model that always fails with a transport error.
#[derive(Debug, Clone)]
pub struct FailingModel {
    message: String,
}

impl FailingModel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ModelClient for FailingModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ModelError> {
        Err(ModelError::Transport(self.message.clone()))
    }
}

/// Model that records every request before replying.
#[derive(Debug, Default)]
pub struct RecordingModel {
    reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ModelClient for RecordingModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        self.requests.lock().push(request);
        Ok(self.reply.clone())
    }
}

/// Model that sleeps before replying; pair with a paused tokio clock to
/// exercise timeouts.
#[derive(Debug, Clone)]
pub struct SlowModel {
    reply: String,
    delay: Duration,
}

impl SlowModel {
    pub fn new(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            reply: reply.into(),
            delay,
        }
    }
}

#[async_trait]
impl ModelClient for SlowModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ModelError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}
