//! Speech synthesis pass-throughs.
//!
//! A [`SpeechSynthesizer`] turns text into audio bytes; an [`AudioSink`]
//! plays them. [`Speaker`] glues the two together with a blocking path and a
//! fire-and-forget path. Synthesis is output-only and never sits on the
//! turn-write path.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Bytes>;
}

#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, audio: Bytes) -> Result<()>;
}

/// OpenAI-compatible HTTP speech endpoint (`POST {base}/v1/audio/speech`).
pub struct HttpTts {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    voice: String,
    speed: f32,
}

impl HttpTts {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: None,
            model: "tts-1".to_string(),
            voice: "nova".to_string(),
            speed: 1.0,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Speech rate multiplier (1.0 = normal).
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.clamp(0.25, 4.0);
        self
    }
}

#[derive(Serialize)]
struct SpeechBody {
    model: String,
    input: String,
    voice: String,
    response_format: String,
    speed: f32,
}

#[async_trait]
impl SpeechSynthesizer for HttpTts {
    async fn synthesize(&self, text: &str) -> Result<Bytes> {
        let body = SpeechBody {
            model: self.model.clone(),
            input: text.to_string(),
            voice: self.voice.clone(),
            response_format: "wav".to_string(),
            speed: self.speed,
        };

        let mut request = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(voice = %self.voice, chars = text.len(), "synthesizing speech");
        let bytes = request
            .send()
            .await
            .context("speech synthesis request failed")?
            .error_for_status()
            .context("speech synthesis service returned an error")?
            .bytes()
            .await?;
        Ok(bytes)
    }
}

/// Synthesizer + sink pair with blocking and detached playback.
pub struct Speaker {
    synth: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
}

impl Speaker {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        Self { synth, sink }
    }

    /// Synthesize and play, waiting for playback to finish.
    pub async fn speak(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            anyhow::bail!("nothing to speak");
        }
        let audio = self.synth.synthesize(text).await?;
        self.sink.play(audio).await
    }

    /// Synthesize and play on a detached task. There is no handle to await
    /// or cancel; failures are logged and dropped.
    pub fn speak_detached(&self, text: impl Into<String>) {
        let text = text.into();
        let synth = Arc::clone(&self.synth);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if text.trim().is_empty() {
                return;
            }
            let result = async {
                let audio = synth.synthesize(&text).await?;
                sink.play(audio).await
            }
            .await;
            if let Err(err) = result {
                warn!(error = %err, "detached speech playback failed");
            }
        });
    }
}
