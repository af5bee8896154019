pub mod mock;
pub mod ollama;

pub use mock::MockChat;
pub use ollama::OllamaChat;
