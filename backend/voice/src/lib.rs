pub mod capture;
pub mod mic;
pub mod synthesis;

pub use capture::{
    AudioSource, CaptureConfig, CaptureEvent, CaptureHandle, SpeechRecognizer, WhisperStt,
    listen_once, spawn_capture,
};
pub use mic::{CommandMic, CommandSink};
pub use synthesis::{AudioSink, HttpTts, Speaker, SpeechSynthesizer};
