//! Append-only conversation record for one session.

use crate::{Message, MessageRole};

/// Rejected append. Nothing is written when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("tool result for '{0}' does not answer any requested tool call")]
    UnknownToolCall(String),
    #[error("expected a {expected} message, got {actual}")]
    WrongRole {
        expected: MessageRole,
        actual: MessageRole,
    },
}

/// Ordered messages exchanged in a session. Insertion order is the only
/// order; entries are never removed or rewritten.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_system(&mut self, text: impl Into<String>) {
        self.messages.push(Message::system(text));
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append an assistant message, with or without tool calls.
    pub fn append_assistant(&mut self, message: Message) -> Result<(), HistoryError> {
        if message.role != MessageRole::Assistant {
            return Err(HistoryError::WrongRole {
                expected: MessageRole::Assistant,
                actual: message.role,
            });
        }
        self.messages.push(message);
        Ok(())
    }

    /// Append a tool result keyed to `call_id`, which must have been
    /// requested by an earlier assistant message.
    pub fn append_tool_result(
        &mut self,
        call_id: &str,
        text: impl Into<String>,
    ) -> Result<(), HistoryError> {
        let requested = self
            .messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::Assistant)
            .flat_map(|m| m.requested_calls())
            .any(|call| call.id == call_id);
        if !requested {
            return Err(HistoryError::UnknownToolCall(call_id.to_string()));
        }
        self.messages.push(Message::tool_result(call_id, text));
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
