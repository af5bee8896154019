use serde::Deserialize;

/// Bliss runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// SQLite conversation database path
    pub db_path: String,
    /// Directory of persona JSON documents
    pub personas_dir: String,
    /// Ollama base URL
    pub ollama_url: String,
    /// Model name to chat with
    pub model: String,
    /// Log level
    pub log_level: String,

    // Speech services (optional; voice mode is off without them)
    pub stt_url: Option<String>,
    pub tts_url: Option<String>,
    pub speech_api_key: Option<String>,
    pub tts_voice: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            db_path: "data/memory.db".to_string(),
            personas_dir: "data/personalities".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            log_level: "info".to_string(),
            stt_url: None,
            tts_url: None,
            speech_api_key: None,
            tts_voice: "nova".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: std::env::var("BLISS_BIND").unwrap_or(defaults.bind_address),
            port: std::env::var("BLISS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            db_path: std::env::var("BLISS_DB").unwrap_or(defaults.db_path),
            personas_dir: std::env::var("BLISS_PERSONAS_DIR").unwrap_or(defaults.personas_dir),
            ollama_url: std::env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            model: std::env::var("BLISS_MODEL").unwrap_or(defaults.model),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            stt_url: std::env::var("BLISS_STT_URL").ok(),
            tts_url: std::env::var("BLISS_TTS_URL").ok(),
            speech_api_key: std::env::var("BLISS_SPEECH_API_KEY").ok(),
            tts_voice: std::env::var("BLISS_TTS_VOICE").unwrap_or(defaults.tts_voice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.db_path, "data/memory.db");
        assert!(config.stt_url.is_none());
    }
}
