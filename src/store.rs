//! In-memory conversation store
//!
//! Holds the ordered chat history of one session together with its busy
//! flag. Every operation is total: content is stored as given.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Model that produced an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Ordered history plus busy flag for one conversation
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    busy: bool,
    /// Sequence number of the next message; survives `clear` so ids stay distinct
    next_seq: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_user(&mut self, content: impl Into<String>) -> Message {
        self.append(Role::User, content.into(), None)
    }

    pub fn append_assistant(
        &mut self,
        content: impl Into<String>,
        model: impl Into<String>,
    ) -> Message {
        self.append(Role::Assistant, content.into(), Some(model.into()))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent user message, if any
    pub fn last_question(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    fn append(&mut self, role: Role, content: String, model: Option<String>) -> Message {
        let created_at = Utc::now();
        let seq = self.next_seq;
        self.next_seq += 1;

        let message = Message {
            id: format!("{}-{seq}", created_at.timestamp_millis()),
            content,
            role,
            created_at,
            model,
        };
        self.messages.push(message.clone());
        message
    }
}
