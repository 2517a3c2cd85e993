//! Conversation history store
//!
//! An ordered, append-only log of messages owned exclusively by the
//! orchestrator. Collaborators only ever see cloned snapshots; insertion
//! order is conversation order and replaying it reconstructs context.

use crate::llm::types::Message;

#[derive(Debug, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Wipe all messages. Clearing an empty history is a no-op.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Roll back to an earlier length, discarding everything a failed turn
    /// appended.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Immutable copy handed to the completion client.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
