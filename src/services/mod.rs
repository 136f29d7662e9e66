pub mod stt;
pub mod tts;

use std::time::Duration;
use thiserror::Error;

pub use stt::{ConsoleListener, ContinuousListener};
pub use tts::{speaker_from_command, CommandSpeaker, ConsoleSpeaker};

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech input error: {0}")]
    Input(String),

    #[error("Speech output error: {0}")]
    Output(String),

    /// The input source has no more utterances
    #[error("Speech input closed")]
    Closed,
}

/// Service trait for speech-to-text, fully blocking
pub trait SpeechInput: Send {
    /// Capture a single utterance. `Ok(None)` when nothing usable was heard
    /// before `timeout`.
    fn listen_once(&mut self, timeout: Duration) -> Result<Option<String>, SpeechError>;
}

/// Service trait for text-to-speech, fully blocking
pub trait SpeechOutput: Send + Sync {
    /// Speak `text` and return once audio has finished. Implementations must
    /// signal speaking started/finished on the audio coordinator.
    fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

impl<T: SpeechOutput + ?Sized> SpeechOutput for Box<T> {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        (**self).speak(text)
    }
}
