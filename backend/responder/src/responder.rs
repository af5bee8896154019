//! The response orchestrator.
//!
//! Composes the persona system prompt, the recent turns for the session, and
//! the new user message into one ordered sequence, calls the chat model, and
//! writes the resulting turn back into the conversation log.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use bliss_core::{BlissError, ChatMessage, ChatModel, ChatRequest, SamplingOptions, Turn};
use bliss_memory::ConversationLog;
use bliss_persona::{PersonaInfo, PersonaStore};

/// Fixed user-visible text substituted when the model call fails.
pub const APOLOGY: &str = "I'm sorry, I couldn't process that request.";

/// Outcome of one generation, before flattening to text.
///
/// The UI-facing contract is a plain string either way; the distinction
/// exists so callers inside the crate (and tests) can see why a reply
/// degraded.
#[derive(Debug)]
pub enum Reply {
    Success { text: String },
    Degraded { text: String, cause: BlissError },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Success { text } | Reply::Degraded { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Success { text } | Reply::Degraded { text, .. } => text,
        }
    }
}

pub struct Responder {
    personas: PersonaStore,
    log: Arc<ConversationLog>,
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl Responder {
    pub fn new(
        personas: PersonaStore,
        log: Arc<ConversationLog>,
        model: Arc<dyn ChatModel>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            personas,
            log,
            model,
            model_name: model_name.into(),
        }
    }

    /// Generate a reply for `user_input`, persist the turn, and return the
    /// reply text. Model failures degrade to the fixed apology; storage
    /// failures propagate.
    pub async fn generate(
        &self,
        user_input: &str,
        persona_name: &str,
        session_id: &str,
        context_limit: usize,
    ) -> Result<String> {
        let reply = self
            .generate_reply(user_input, persona_name, session_id, context_limit)
            .await?;
        Ok(reply.into_text())
    }

    /// Like [`generate`](Self::generate), but keeps the success/degraded
    /// distinction.
    pub async fn generate_reply(
        &self,
        user_input: &str,
        persona_name: &str,
        session_id: &str,
        context_limit: usize,
    ) -> Result<Reply> {
        let persona = self.personas.load(persona_name);
        let history = self.log.recent(session_id, context_limit).await?;

        let messages = build_messages(&persona.render_prompt(), &history, user_input);
        let request = ChatRequest {
            model: self.model_name.clone(),
            messages,
            options: SamplingOptions::default(),
        };

        match self.model.chat(&request).await {
            Ok(reply) => {
                let text = reply.content.trim().to_string();
                self.log.append(user_input, &text, session_id).await?;
                info!(
                    session = session_id,
                    tokens = reply.eval_tokens,
                    latency_ms = reply.latency_ms,
                    "reply generated"
                );
                Ok(Reply::Success { text })
            }
            Err(err) => {
                warn!(session = session_id, error = %err, "model call failed, substituting apology");
                self.log.append(user_input, APOLOGY, session_id).await?;
                Ok(Reply::Degraded {
                    text: APOLOGY.to_string(),
                    cause: BlissError::Model {
                        provider: self.model.name().to_string(),
                        message: err.to_string(),
                    },
                })
            }
        }
    }

    pub fn greeting(&self, persona_name: &str) -> String {
        self.personas.load(persona_name).greeting()
    }

    pub fn farewell(&self, persona_name: &str) -> String {
        self.personas.load(persona_name).farewell()
    }

    pub fn list_personas(&self) -> Vec<String> {
        self.personas.list_available()
    }

    pub fn persona_info(&self, persona_name: &str) -> PersonaInfo {
        self.personas.load(persona_name).info()
    }

    pub async fn conversation_count(&self, session_id: &str) -> Result<i64> {
        self.log.count(session_id).await
    }

    pub async fn clear_session(&self, session_id: &str) -> Result<usize> {
        self.log.clear(session_id).await
    }

    /// True when the configured model (or a tag-qualified variant of it,
    /// e.g. `mistral:latest` for `mistral`) is served by the backend.
    pub async fn check_model(&self) -> Result<bool> {
        let models = self.model.available_models().await?;
        let prefix = format!("{}:", self.model_name);
        Ok(models
            .iter()
            .any(|m| m == &self.model_name || m.starts_with(&prefix)))
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// One system entry, then each stored turn replayed as a user/assistant pair
/// in chronological order, then the new user message last.
fn build_messages(system_prompt: &str, history: &[Turn], user_input: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 + history.len() * 2);
    messages.push(ChatMessage::system(system_prompt));
    for turn in history {
        messages.push(ChatMessage::user(&turn.user_text));
        messages.push(ChatMessage::assistant(&turn.assistant_text));
    }
    messages.push(ChatMessage::user(user_input));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockChat;
    use bliss_core::ChatRole;

    fn persona_store_with_default(dir: &std::path::Path) -> PersonaStore {
        std::fs::write(
            dir.join("default.json"),
            r#"{"personality": {"name": "Bliss", "traits": ["friendly"]}}"#,
        )
        .unwrap();
        PersonaStore::new(dir)
    }

    fn responder_with(model: Arc<MockChat>, dir: &std::path::Path) -> Responder {
        let log = Arc::new(ConversationLog::in_memory().unwrap());
        Responder::new(persona_store_with_default(dir), log, model, "mock")
    }

    #[tokio::test]
    async fn test_message_sequence_replays_history_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(MockChat::replying("not much!"));
        let responder = responder_with(Arc::clone(&model), dir.path());

        responder.log.append("hi", "hello!", "s1").await.unwrap();
        responder.log.append("bye", "see ya", "s1").await.unwrap();

        let reply = responder
            .generate("what's up", "default", "s1", 5)
            .await
            .unwrap();
        assert_eq!(reply, "not much!");

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        let messages = &requests[0].messages;
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.starts_with("You are Bliss"));
        assert_eq!(messages[1], ChatMessage::user("hi"));
        assert_eq!(messages[2], ChatMessage::assistant("hello!"));
        assert_eq!(messages[3], ChatMessage::user("bye"));
        assert_eq!(messages[4], ChatMessage::assistant("see ya"));
        assert_eq!(messages[5], ChatMessage::user("what's up"));
    }

    #[tokio::test]
    async fn test_context_limit_bounds_history() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(MockChat::replying("ok"));
        let responder = responder_with(Arc::clone(&model), dir.path());

        for i in 0..4 {
            responder
                .log
                .append(&format!("u{i}"), &format!("a{i}"), "s1")
                .await
                .unwrap();
        }

        responder.generate("next", "default", "s1", 2).await.unwrap();

        let messages = model.requests()[0].messages.clone();
        // system + 2 replayed turns + new input
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[1], ChatMessage::user("u2"));
        assert_eq!(messages[3], ChatMessage::user("u3"));
    }

    #[tokio::test]
    async fn test_reply_is_trimmed_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(MockChat::replying("  hello there \n"));
        let responder = responder_with(model, dir.path());

        let reply = responder.generate("hi", "default", "s1", 5).await.unwrap();
        assert_eq!(reply, "hello there");

        let turns = responder.log.recent("s1", 1).await.unwrap();
        assert_eq!(turns[0].user_text, "hi");
        assert_eq!(turns[0].assistant_text, "hello there");
    }

    #[tokio::test]
    async fn test_model_failure_degrades_to_apology() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(MockChat::failing());
        let responder = responder_with(model, dir.path());

        let reply = responder
            .generate_reply("hi", "default", "s1", 5)
            .await
            .unwrap();

        match &reply {
            Reply::Degraded { text, cause } => {
                assert_eq!(text, APOLOGY);
                assert!(matches!(cause, BlissError::Model { .. }));
            }
            Reply::Success { .. } => panic!("expected degraded reply"),
        }
        assert_eq!(reply.text(), APOLOGY);

        // The failure is still recorded as exactly one turn.
        assert_eq!(responder.conversation_count("s1").await.unwrap(), 1);
        let turns = responder.log.recent("s1", 1).await.unwrap();
        assert_eq!(turns[0].assistant_text, APOLOGY);
    }

    #[tokio::test]
    async fn test_flattened_contract_hides_the_cause() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(MockChat::failing());
        let responder = responder_with(model, dir.path());

        let reply = responder.generate("hi", "default", "s1", 5).await.unwrap();
        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn test_check_model_accepts_tag_qualified_names() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(
            MockChat::replying("ok").with_models(vec!["mock:latest".into(), "other".into()]),
        );
        let responder = responder_with(model, dir.path());
        assert!(responder.check_model().await.unwrap());

        let dir2 = tempfile::tempdir().unwrap();
        let absent = Arc::new(MockChat::replying("ok").with_models(vec!["other".into()]));
        let responder = responder_with(absent, dir2.path());
        assert!(!responder.check_model().await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_session_resets_count() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(MockChat::replying("ok"));
        let responder = responder_with(model, dir.path());

        responder.generate("hi", "default", "s1", 5).await.unwrap();
        assert_eq!(responder.conversation_count("s1").await.unwrap(), 1);

        responder.clear_session("s1").await.unwrap();
        assert_eq!(responder.conversation_count("s1").await.unwrap(), 0);
    }
}
