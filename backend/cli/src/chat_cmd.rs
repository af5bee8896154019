//! Interactive terminal chat loop.
//!
//! Typed input always works; `--voice` additionally listens on the
//! microphone capture channel, and `--speak` plays replies through the
//! configured synthesizer.

use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use bliss_config::Config;
use bliss_responder::Responder;
use bliss_voice::{
    CaptureConfig, CaptureEvent, CaptureHandle, CommandMic, CommandSink, HttpTts, Speaker,
    WhisperStt, spawn_capture,
};

pub struct ChatOptions {
    pub persona: String,
    pub session: String,
    pub context_limit: usize,
    pub voice: bool,
    pub speak: bool,
}

pub async fn run(responder: Arc<Responder>, config: &Config, opts: ChatOptions) -> Result<()> {
    let speaker = build_speaker(config, opts.speak);

    let greeting = responder.greeting(&opts.persona);
    println!("{greeting}");
    if let Some(speaker) = &speaker {
        speaker.speak_detached(greeting);
    }

    let mut capture = if opts.voice { build_capture(config) } else { None };

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut capture_stopped = false;
        let input = match &mut capture {
            Some(handle) => tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => line,
                    None => break,
                },
                event = handle.recv() => match event {
                    Some(CaptureEvent::Recognized(text)) => {
                        println!("{text}");
                        text
                    }
                    Some(CaptureEvent::Error(message)) => {
                        eprintln!("[voice] {message}");
                        continue;
                    }
                    None => {
                        eprintln!("[voice] capture stopped; typed input only");
                        capture_stopped = true;
                        String::new()
                    }
                },
            },
            None => match lines.next_line().await? {
                Some(line) => line,
                None => break,
            },
        };
        if capture_stopped {
            capture = None;
            continue;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/clear" => {
                responder.clear_session(&opts.session).await?;
                println!("Conversation cleared.");
            }
            "/count" => {
                let count = responder.conversation_count(&opts.session).await?;
                println!("{count} turns stored in session '{}'", opts.session);
            }
            "/personas" => {
                for name in responder.list_personas() {
                    println!("{name}");
                }
            }
            "/persona" => {
                let info = responder.persona_info(&opts.persona);
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
            message => {
                let reply = responder
                    .generate(message, &opts.persona, &opts.session, opts.context_limit)
                    .await?;
                println!("bliss> {reply}");
                if let Some(speaker) = &speaker {
                    speaker.speak_detached(reply);
                }
            }
        }
    }

    if let Some(handle) = capture.take() {
        handle.shutdown().await;
    }

    let farewell = responder.farewell(&opts.persona);
    println!("{farewell}");
    if let Some(speaker) = &speaker {
        // Spoken farewell finishes before the process exits.
        if let Err(err) = speaker.speak(&farewell).await {
            warn!(error = %err, "farewell playback failed");
        }
    }

    Ok(())
}

fn build_capture(config: &Config) -> Option<CaptureHandle> {
    let Some(stt_url) = &config.stt_url else {
        warn!("voice input requested but BLISS_STT_URL is not set; typed input only");
        return None;
    };
    let mut recognizer = WhisperStt::new(stt_url.as_str());
    if let Some(key) = &config.speech_api_key {
        recognizer = recognizer.with_api_key(key.as_str());
    }
    Some(spawn_capture(
        Arc::new(CommandMic::arecord()),
        Arc::new(recognizer),
        CaptureConfig::default(),
    ))
}

fn build_speaker(config: &Config, enabled: bool) -> Option<Speaker> {
    if !enabled {
        return None;
    }
    match &config.tts_url {
        Some(url) => {
            let mut synth = HttpTts::new(url.as_str()).with_voice(config.tts_voice.as_str());
            if let Some(key) = &config.speech_api_key {
                synth = synth.with_api_key(key.as_str());
            }
            Some(Speaker::new(Arc::new(synth), Arc::new(CommandSink::aplay())))
        }
        None => {
            warn!("--speak requested but BLISS_TTS_URL is not set; replies stay silent");
            None
        }
    }
}
