use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use bliss_core::{ChatModel, ChatReply, ChatRequest};

/// Chat backend talking to a local Ollama instance.
pub struct OllamaChat {
    client: Client,
    base_url: String,
}

impl OllamaChat {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for OllamaChat {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelTag>,
}

#[derive(Deserialize)]
struct OllamaModelTag {
    name: String,
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let start = Instant::now();

        let messages = request
            .messages
            .iter()
            .map(|m| OllamaChatMessage {
                role: match m.role {
                    bliss_core::ChatRole::System => "system",
                    bliss_core::ChatRole::User => "user",
                    bliss_core::ChatRole::Assistant => "assistant",
                }
                .to_string(),
                content: m.content.clone(),
            })
            .collect();

        let body = OllamaChatRequest {
            model: request.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.options.temperature,
                top_p: request.options.top_p,
                num_predict: request.options.num_predict,
            },
        };

        debug!(model = %request.model, messages = request.messages.len(), "sending chat request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("failed to parse Ollama response")?;

        let eval_tokens = chat_response.eval_count.unwrap_or(0)
            + chat_response.prompt_eval_count.unwrap_or(0);

        Ok(ChatReply {
            content: chat_response.message.content,
            model: request.model.clone(),
            eval_tokens,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn available_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .context("Ollama HTTP request failed")?
            .error_for_status()
            .context("Ollama tag listing failed")?;

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .context("failed to parse Ollama tag listing")?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
