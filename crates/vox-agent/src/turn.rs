//! The turn orchestrator state machine.
//!
//! One turn runs `AwaitingModel -> ExecutingTools -> AwaitingModel` until
//! the model produces a final text reply (`Complete`). Every message the
//! turn produces is committed to session memory before it returns.

use futures::future::join_all;
use tracing::{debug, warn};

use vox_ai::{AiClient, AiError, Message, ModelReply, ToolCall};
use vox_tools::ToolRegistry;

use crate::memory::SessionMemory;

/// Spoken when the model finishes a turn without any reply text.
pub const FALLBACK_REPLY: &str = "I completed the task.";

const DEFAULT_MAX_TOOL_ROUNDS: u32 = 8;

/// Phases of one turn, in the order a turn moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingModel,
    ExecutingTools,
    Complete,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("Model error: {0}")]
    Model(#[from] AiError),
}

/// Drives one utterance through the model/tool loop to a final reply.
///
/// Tool resolution and execution failures are folded into tool-result text
/// and never abort a turn; only the model boundary can fail one.
pub struct TurnOrchestrator {
    client: Box<dyn AiClient>,
    registry: ToolRegistry,
    max_tool_rounds: u32,
}

impl TurnOrchestrator {
    pub fn new(client: Box<dyn AiClient>, registry: ToolRegistry) -> Self {
        Self {
            client,
            registry,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one full turn: commit the utterance to memory, loop the model
    /// and tool execution, and return the reply to speak.
    ///
    /// On a model error the user message stays in memory, so the next turn
    /// still has the context.
    pub async fn run_turn(
        &self,
        memory: &mut SessionMemory,
        utterance: &str,
    ) -> Result<String, TurnError> {
        memory.append(Message::user(utterance));

        let definitions = self.registry.definitions();
        let mut rounds = 0u32;

        loop {
            debug!(phase = ?TurnPhase::AwaitingModel, turns = memory.len(), "requesting reply");
            let reply = self.client.generate(memory.snapshot(), &definitions).await?;

            match reply {
                ModelReply::Text(text) => {
                    let spoken = if text.trim().is_empty() {
                        FALLBACK_REPLY.to_string()
                    } else {
                        text
                    };
                    memory.append(Message::assistant(&spoken));
                    debug!(phase = ?TurnPhase::Complete, "turn finished");
                    return Ok(spoken);
                }
                ModelReply::ToolUse { preamble, calls } => {
                    if rounds >= self.max_tool_rounds {
                        // The requests are dropped, not committed, so memory
                        // holds no invocation without a result.
                        warn!(
                            rounds,
                            "tool round limit reached, ending turn with fallback"
                        );
                        memory.append(Message::assistant(FALLBACK_REPLY));
                        return Ok(FALLBACK_REPLY.to_string());
                    }
                    rounds += 1;

                    debug!(
                        phase = ?TurnPhase::ExecutingTools,
                        round = rounds,
                        calls = calls.len(),
                        "executing requested tools"
                    );
                    memory.append(Message::tool_use(preamble, calls.clone()));

                    // Concurrent dispatch; join_all yields results in
                    // request order, which is the order the model must see.
                    let results = join_all(calls.iter().map(|call| self.execute_call(call))).await;
                    for message in results {
                        memory.append(message);
                    }
                }
            }
        }
    }

    /// Execute one requested invocation. Unknown names and failed
    /// executions become result text for the model to react to.
    async fn execute_call(&self, call: &ToolCall) -> Message {
        let Some(tool) = self.registry.resolve(&call.name) else {
            warn!(tool = %call.name, "model requested unknown tool");
            return Message::tool_result(
                &call.id,
                &call.name,
                format!("Error: tool '{}' not found", call.name),
            );
        };

        debug!(tool = %call.name, "executing tool");
        match tool.invoke(call.arguments.clone()).await {
            Ok(text) => Message::tool_result(&call.id, &call.name, text),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool execution failed");
                Message::tool_result(&call.id, &call.name, format!("Error: {e}"))
            }
        }
    }
}
