//! UI-agnostic conversation state
//!
//! The conversation is an append-only list of messages owned by one chat
//! session. The only destructive operation is a full clear, which also bumps
//! a generation counter so that replies belonging to a cleared conversation
//! can be recognized and discarded.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// The sender of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    Error,
}

/// A single message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    generation: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id. Ids are monotonic per
    /// conversation, so insertion order equals conversation order.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            text: text.into(),
            created_at: Local::now(),
        });
        id
    }

    /// Discard all messages and start a new generation. Any reply still in
    /// flight for the old generation must be dropped on arrival.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.generation += 1;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order_and_assigns_monotonic_ids() {
        let mut conv = Conversation::new();
        let a = conv.push(Role::User, "first");
        let b = conv.push(Role::Assistant, "second");
        let c = conv.push(Role::Error, "third");

        assert!(a < b && b < c);
        let texts: Vec<&str> = conv.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn clear_empties_and_bumps_generation() {
        let mut conv = Conversation::new();
        conv.push(Role::User, "hello");
        let before = conv.generation();

        conv.clear();

        assert!(conv.is_empty());
        assert_eq!(conv.generation(), before + 1);
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut conv = Conversation::new();
        let first = conv.push(Role::User, "one");
        conv.clear();
        let second = conv.push(Role::User, "two");
        assert!(second > first);
    }
}
