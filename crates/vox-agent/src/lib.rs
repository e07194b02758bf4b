//! Agent core for Vox: session memory and the turn orchestrator.
//!
//! A turn takes one recognized utterance through the model/tool loop to a
//! final reply: the model either answers in text or requests tool
//! invocations, whose results are fed back until it answers. The loop is
//! bounded; tool failures never escape a turn.

pub mod memory;
pub mod turn;

pub use memory::SessionMemory;
pub use turn::{TurnError, TurnOrchestrator, TurnPhase, FALLBACK_REPLY};
