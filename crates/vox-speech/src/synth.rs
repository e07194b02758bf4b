//! External-command speech synthesis.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{strip_markup, SpeechOutput};

/// Speaks by handing text to an external synthesizer command (`espeak`,
/// `say`, `spd-say`, ...). A missing or failing synthesizer is logged and
/// the session continues silently.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeaker {
    async fn speak(&mut self, text: &str) {
        let clean = strip_markup(text);
        debug!(chars = clean.len(), "synthesizing speech");

        let spawned = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&clean)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                // Waiting keeps replies and listening from overlapping.
                if let Err(e) = child.wait().await {
                    warn!(error = %e, "synthesizer did not exit cleanly");
                }
            }
            Err(e) => {
                warn!(program = %self.program, error = %e, "failed to start synthesizer");
            }
        }
    }
}
