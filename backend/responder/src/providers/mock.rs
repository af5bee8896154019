//! Scripted chat backend for tests.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use bliss_core::{ChatModel, ChatReply, ChatRequest};

/// A chat backend that replays a fixed reply (or a fixed failure) and records
/// every request it receives, so tests can assert on the exact message
/// sequence the orchestrator built.
pub struct MockChat {
    reply: Option<String>,
    models: Vec<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChat {
    /// A backend that always answers with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            models: vec!["mock".to_string()],
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A backend whose every chat call fails.
    pub fn failing() -> Self {
        Self {
            reply: None,
            models: vec!["mock".to_string()],
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for MockChat {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Some(reply) => Ok(ChatReply {
                content: reply.clone(),
                model: request.model.clone(),
                eval_tokens: 0,
                latency_ms: 0,
            }),
            None => anyhow::bail!("mock chat backend configured to fail"),
        }
    }

    async fn available_models(&self) -> Result<Vec<String>> {
        Ok(self.models.clone())
    }
}
