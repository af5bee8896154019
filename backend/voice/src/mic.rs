//! OS-command pass-throughs for audio capture and playback.
//!
//! The actual capture and playback engines are external: recording shells
//! out to an ALSA-style recorder (`arecord -t wav -`) and playback pipes
//! into a player (`aplay -`). Both are seams, swappable via
//! [`AudioSource`]/[`AudioSink`] for platforms with different tooling.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::capture::AudioSource;
use crate::synthesis::AudioSink;

/// Records one phrase by running an external capture command that writes WAV
/// to stdout. The recorder has no silence detection, so a phrase is always
/// `phrase_limit` long; the start-of-speech timeout is handled by the
/// recognizer returning nothing for silent audio.
pub struct CommandMic {
    program: String,
    sample_rate: u32,
}

impl CommandMic {
    /// `arecord`, the ALSA capture tool.
    pub fn arecord() -> Self {
        Self {
            program: "arecord".to_string(),
            sample_rate: 16_000,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }
}

#[async_trait]
impl AudioSource for CommandMic {
    async fn record_phrase(
        &self,
        _timeout: Duration,
        phrase_limit: Duration,
    ) -> Result<Option<Bytes>> {
        let secs = phrase_limit.as_secs().max(1);
        debug!(program = %self.program, secs, "recording phrase");

        let output = Command::new(&self.program)
            .args([
                "-q",
                "-f",
                "S16_LE",
                "-r",
                &self.sample_rate.to_string(),
                "-d",
                &secs.to_string(),
                "-t",
                "wav",
                "-",
            ])
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("failed to run capture command {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} exited with {}: {}", self.program, output.status, stderr);
        }
        if output.stdout.is_empty() {
            return Ok(None);
        }
        Ok(Some(Bytes::from(output.stdout)))
    }
}

/// Plays audio by piping it into an external player command.
pub struct CommandSink {
    program: String,
}

impl CommandSink {
    /// `aplay`, the ALSA playback tool.
    pub fn aplay() -> Self {
        Self {
            program: "aplay".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl AudioSink for CommandSink {
    async fn play(&self, audio: Bytes) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(["-q", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to run playback command {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&audio)
                .await
                .context("failed to write audio to player")?;
            // Drop closes the pipe so the player can finish.
        }

        let status = child.wait().await?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}
