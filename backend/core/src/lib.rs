pub mod chat;
pub mod error;
pub mod traits;

pub use chat::{ChatMessage, ChatRole, Turn};
pub use error::BlissError;
pub use traits::{ChatModel, ChatReply, ChatRequest, SamplingOptions};
