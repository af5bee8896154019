//! Continuous speech capture.
//!
//! A single producer task records phrases from an [`AudioSource`], runs them
//! through a [`SpeechRecognizer`], and pushes events into a bounded channel.
//! The consumer side holds a [`CaptureHandle`]; cancelling its token stops
//! the loop. Exactly one producer and one consumer touch the channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One listen cycle worth of raw audio. `None` means the cycle timed out
/// without hearing speech.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn record_phrase(
        &self,
        timeout: Duration,
        phrase_limit: Duration,
    ) -> Result<Option<Bytes>>;
}

/// Turns recorded audio into text. `Ok(None)` means the audio was
/// unintelligible; `Err` means the recognition service itself failed.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(&self, audio: Bytes) -> Result<Option<String>>;
}

/// Event delivered to the capture consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Recognized(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum wait for speech to start within one cycle.
    pub timeout: Duration,
    /// Maximum length of one recorded phrase.
    pub phrase_limit: Duration,
    /// Bounded channel capacity between producer and consumer.
    pub buffer: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            phrase_limit: Duration::from_secs(5),
            buffer: 16,
        }
    }
}

/// Consumer side of a running capture loop.
pub struct CaptureHandle {
    events: mpsc::Receiver<CaptureEvent>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl CaptureHandle {
    /// Receive the next event; `None` once the loop has stopped and drained.
    pub async fn recv(&mut self) -> Option<CaptureEvent> {
        self.events.recv().await
    }

    /// Signal the producer to stop after its current cycle.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Stop the loop and wait for the producer task to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.task.await;
    }
}

/// Spawn the capture loop and hand back the consumer side.
pub fn spawn_capture(
    source: Arc<dyn AudioSource>,
    recognizer: Arc<dyn SpeechRecognizer>,
    config: CaptureConfig,
) -> CaptureHandle {
    let (tx, rx) = mpsc::channel(config.buffer);
    let token = CancellationToken::new();
    let loop_token = token.clone();

    let task = tokio::spawn(async move {
        loop {
            let phrase = tokio::select! {
                _ = loop_token.cancelled() => break,
                phrase = source.record_phrase(config.timeout, config.phrase_limit) => phrase,
            };

            match phrase {
                // Timed out waiting for speech: keep listening.
                Ok(None) => continue,
                Ok(Some(audio)) => match recognizer.transcribe(audio).await {
                    Ok(Some(text)) => {
                        debug!(len = text.len(), "phrase recognized");
                        if tx.send(CaptureEvent::Recognized(text)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        if tx
                            .send(CaptureEvent::Error(
                                "Could not understand the audio.".to_string(),
                            ))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "recognition request failed, stopping capture");
                        let _ = tx.send(CaptureEvent::Error(err.to_string())).await;
                        break;
                    }
                },
                Err(err) => {
                    warn!(error = %err, "audio capture failed, stopping capture");
                    let _ = tx.send(CaptureEvent::Error(err.to_string())).await;
                    break;
                }
            }
        }
    });

    CaptureHandle { events: rx, token, task }
}

/// Listen for a single phrase and return the recognized text, if any.
pub async fn listen_once(
    source: &dyn AudioSource,
    recognizer: &dyn SpeechRecognizer,
    timeout: Duration,
    phrase_limit: Duration,
) -> Result<Option<String>> {
    let Some(audio) = source.record_phrase(timeout, phrase_limit).await? else {
        return Ok(None);
    };
    recognizer.transcribe(audio).await
}

/// Whisper-compatible HTTP transcription endpoint
/// (`POST {base}/v1/audio/transcriptions`).
pub struct WhisperStt {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl WhisperStt {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: None,
            model: "whisper-1".to_string(),
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
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl SpeechRecognizer for WhisperStt {
    async fn transcribe(&self, audio: Bytes) -> Result<Option<String>> {
        let part = Part::bytes(audio.to_vec())
            .file_name("phrase.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let mut request = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("transcription request failed")?
            .error_for_status()
            .context("transcription service returned an error")?;

        let body: TranscriptionResponse = response
            .json()
            .await
            .context("failed to parse transcription response")?;

        let text = body.text.trim().to_string();
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of listen cycles, then times out forever.
    struct ScriptedSource {
        phrases: Mutex<VecDeque<Result<Option<Bytes>>>>,
    }

    impl ScriptedSource {
        fn new(phrases: Vec<Result<Option<Bytes>>>) -> Self {
            Self {
                phrases: Mutex::new(phrases.into()),
            }
        }
    }

    #[async_trait]
    impl AudioSource for ScriptedSource {
        async fn record_phrase(
            &self,
            _timeout: Duration,
            _phrase_limit: Duration,
        ) -> Result<Option<Bytes>> {
            let next = self.phrases.lock().unwrap().pop_front();
            match next {
                Some(item) => item,
                None => {
                    // Script exhausted: park like an endlessly silent
                    // microphone so only cancellation ends the loop.
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }

    /// Recognizes UTF-8 payloads; empty payloads are unintelligible, the
    /// literal `FAIL` payload is a service failure.
    struct EchoRecognizer;

    #[async_trait]
    impl SpeechRecognizer for EchoRecognizer {
        async fn transcribe(&self, audio: Bytes) -> Result<Option<String>> {
            let text = String::from_utf8(audio.to_vec()).unwrap_or_default();
            if text == "FAIL" {
                anyhow::bail!("recognition service unreachable");
            }
            Ok(if text.is_empty() { None } else { Some(text) })
        }
    }

    fn phrase(text: &str) -> Result<Option<Bytes>> {
        Ok(Some(Bytes::from(text.as_bytes().to_vec())))
    }

    #[tokio::test]
    async fn test_recognized_phrases_flow_through_in_order() {
        let source = Arc::new(ScriptedSource::new(vec![
            phrase("hello"),
            Ok(None), // timeout cycle, skipped silently
            phrase("world"),
        ]));
        let mut handle =
            spawn_capture(source, Arc::new(EchoRecognizer), CaptureConfig::default());

        assert_eq!(
            handle.recv().await,
            Some(CaptureEvent::Recognized("hello".into()))
        );
        assert_eq!(
            handle.recv().await,
            Some(CaptureEvent::Recognized("world".into()))
        );
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_unintelligible_audio_reports_and_continues() {
        let source = Arc::new(ScriptedSource::new(vec![phrase(""), phrase("after")]));
        let mut handle =
            spawn_capture(source, Arc::new(EchoRecognizer), CaptureConfig::default());

        assert_eq!(
            handle.recv().await,
            Some(CaptureEvent::Error("Could not understand the audio.".into()))
        );
        assert_eq!(
            handle.recv().await,
            Some(CaptureEvent::Recognized("after".into()))
        );
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_recognizer_failure_stops_the_loop() {
        let source = Arc::new(ScriptedSource::new(vec![phrase("FAIL"), phrase("never")]));
        let mut handle =
            spawn_capture(source, Arc::new(EchoRecognizer), CaptureConfig::default());

        match handle.recv().await {
            Some(CaptureEvent::Error(msg)) => assert!(msg.contains("unreachable")),
            other => panic!("expected error event, got {other:?}"),
        }
        // Producer stopped: the channel drains to None.
        assert_eq!(handle.recv().await, None);
    }

    #[tokio::test]
    async fn test_cancellation_stops_an_idle_loop() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let handle = spawn_capture(source, Arc::new(EchoRecognizer), CaptureConfig::default());

        handle.stop();
        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("capture task did not stop after cancellation");
    }

    #[tokio::test]
    async fn test_listen_once() {
        let source = ScriptedSource::new(vec![phrase("one shot")]);
        let text = listen_once(
            &source,
            &EchoRecognizer,
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(text.as_deref(), Some("one shot"));

        let silent = ScriptedSource::new(vec![Ok(None)]);
        let text = listen_once(
            &silent,
            &EchoRecognizer,
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(text, None);
    }
}
