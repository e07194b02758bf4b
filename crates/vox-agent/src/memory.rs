//! Append-only conversation log for one session.

use uuid::Uuid;
use vox_ai::Message;

/// Ordered conversation history, alive for one process lifetime.
///
/// Entries are appended, never mutated, reordered, or pruned; the full
/// history is what the model sees each turn. Sending everything every time
/// trades request size for simplicity; truncation or summarization could be
/// layered on without changing this surface.
pub struct SessionMemory {
    id: String,
    messages: Vec<Message>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }

    /// Session identifier, minted at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Read-only chronological view.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self::new()
    }
}
