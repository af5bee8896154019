use anyhow::Result;
use async_trait::async_trait;

use crate::chat::ChatMessage;

/// Sampling parameters sent with every chat call.
///
/// These are fixed for the lifetime of the process; callers do not tune them
/// per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub num_predict: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            num_predict: 500,
        }
    }
}

/// Request to a chat model.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: SamplingOptions,
}

/// Response from a chat model.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub model: String,
    pub eval_tokens: u64,
    pub latency_ms: u64,
}

/// Trait for chat-style model backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Backend name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send an ordered message sequence and return the single reply.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// List the model names the backend currently serves.
    async fn available_models(&self) -> Result<Vec<String>>;
}
