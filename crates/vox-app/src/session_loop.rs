//! The outer session cycle: listen for an utterance, run one turn, speak
//! the reply.
//!
//! Exit phrases and input exhaustion end the session gracefully. A failed
//! turn is spoken as an apology and the session continues; this is the one
//! place model-boundary errors become user-facing speech.

use tracing::{debug, info, warn};

use vox_agent::{SessionMemory, TurnOrchestrator};
use vox_speech::{SpeechError, SpeechInput, SpeechOutput};

pub const GREETING: &str = "Hi, I'm Vox. How can I help you today?";
pub const FAREWELL: &str = "Goodbye. Have a great day!";

/// Phrases that end the session, matched case-insensitively anywhere in
/// the utterance.
const EXIT_PHRASES: &[&str] = &["exit", "stop", "quit", "goodbye"];

/// Consecutive `listen()` failures tolerated before the input source is
/// treated as gone. Keeps a permanently broken source from spinning the
/// loop hot.
const MAX_LISTEN_FAILURES: u32 = 5;

/// How a session ended. All outcomes are graceful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The user said an exit phrase and was bid farewell.
    Farewell,
    /// The input source reached end of input.
    InputClosed,
    /// An interrupt signal ended the session from outside the loop.
    Interrupted,
}

pub struct SessionLoop<I, O> {
    input: I,
    output: O,
    orchestrator: TurnOrchestrator,
    memory: SessionMemory,
}

impl<I: SpeechInput, O: SpeechOutput> SessionLoop<I, O> {
    pub fn new(input: I, output: O, orchestrator: TurnOrchestrator, memory: SessionMemory) -> Self {
        Self {
            input,
            output,
            orchestrator,
            memory,
        }
    }

    /// Run the session until an exit phrase or the input closes.
    ///
    /// Silence re-listens without touching the orchestrator, so idle cycles
    /// cost nothing.
    pub async fn run(mut self) -> LoopOutcome {
        info!(session = self.memory.id(), "session started");
        self.output.speak(GREETING).await;

        let mut listen_failures = 0u32;
        loop {
            let utterance = match self.input.listen().await {
                Ok(Some(text)) => {
                    listen_failures = 0;
                    text
                }
                Ok(None) => {
                    listen_failures = 0;
                    continue;
                }
                Err(SpeechError::Closed) => {
                    info!(session = self.memory.id(), "input closed, ending session");
                    return LoopOutcome::InputClosed;
                }
                Err(e) => {
                    listen_failures += 1;
                    if listen_failures >= MAX_LISTEN_FAILURES {
                        warn!(error = %e, failures = listen_failures, "input keeps failing, ending session");
                        return LoopOutcome::InputClosed;
                    }
                    warn!(error = %e, "listen failed, retrying");
                    continue;
                }
            };

            if is_exit_phrase(&utterance) {
                self.output.speak(FAREWELL).await;
                return LoopOutcome::Farewell;
            }

            debug!(session = self.memory.id(), "processing utterance");
            match self.orchestrator.run_turn(&mut self.memory, &utterance).await {
                Ok(reply) => self.output.speak(&reply).await,
                Err(e) => {
                    warn!(error = %e, "turn failed");
                    self.output
                        .speak(&format!("Sorry, I encountered an error: {e}"))
                        .await;
                }
            }
        }
    }
}

fn is_exit_phrase(utterance: &str) -> bool {
    let lowered = utterance.to_lowercase();
    EXIT_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}
