//! Speech boundary for Vox.
//!
//! Defines the listen/speak traits the session loop drives, with console
//! implementations and an external-command synthesizer. Output text is
//! stripped of markup before it is voiced, since replies are heard, not
//! rendered.

pub mod console;
pub mod synth;

use async_trait::async_trait;

pub use console::{ConsoleInput, ConsolePrinter};
pub use synth::CommandSpeaker;

/// Source of recognized utterances.
#[async_trait]
pub trait SpeechInput: Send {
    /// Block until something is recognized. Silence, timeouts, and
    /// unintelligible audio are `Ok(None)`, never errors;
    /// `Err(SpeechError::Closed)` means the source is exhausted and no
    /// further utterances will arrive.
    async fn listen(&mut self) -> Result<Option<String>, SpeechError>;
}

/// Sink for spoken replies.
#[async_trait]
pub trait SpeechOutput: Send {
    /// Speak `text`. Implementations strip markup and tolerate synthesizer
    /// failure; a failed utterance is logged, not propagated.
    async fn speak(&mut self, text: &str);
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The input source reached end of input.
    #[error("Input closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remove markup characters that read poorly aloud.
pub fn strip_markup(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '*' | '#' | '`')).collect()
}
