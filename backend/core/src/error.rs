use thiserror::Error;

/// Top-level error type for the Bliss runtime.
#[derive(Debug, Error)]
pub enum BlissError {
    #[error("persona error: {0}")]
    Persona(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("model error ({provider}): {message}")]
    Model { provider: String, message: String },

    #[error("voice error: {0}")]
    Voice(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
