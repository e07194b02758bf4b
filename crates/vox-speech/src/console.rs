//! Console implementations of the speech boundary, for text-mode sessions.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::{strip_markup, SpeechError, SpeechInput, SpeechOutput};

/// Reads utterances line by line from stdin. Blank lines count as silence.
pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechInput for ConsoleInput {
    async fn listen(&mut self) -> Result<Option<String>, SpeechError> {
        match self.lines.next_line().await? {
            Some(line) => {
                let line = line.trim();
                if line.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(line.to_string()))
                }
            }
            None => Err(SpeechError::Closed),
        }
    }
}

/// Prints replies instead of synthesizing them.
pub struct ConsolePrinter;

#[async_trait]
impl SpeechOutput for ConsolePrinter {
    async fn speak(&mut self, text: &str) {
        println!("{}", strip_markup(text));
    }
}
