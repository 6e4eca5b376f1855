//! Per-session conversation history.
//!
//! A [`Conversation`] is an append-only message log owned by exactly one
//! session. The orchestration loop takes it by `&mut` for the duration of a
//! turn, so two turns can never interleave on the same history.

use uuid::Uuid;

use crate::message::{Message, Role};

/// Ordered, append-only sequence of messages for one conversation.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }

    /// Starts a conversation with a system prompt as its first message.
    pub fn with_system_prompt(prompt: Option<&str>) -> Self {
        let mut conversation = Self::new();
        if let Some(prompt) = prompt.filter(|p| !p.trim().is_empty()) {
            conversation.push(Message::system(prompt));
        }
        conversation
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Short id for display and log fields.
    pub fn short_id(&self) -> &str {
        &self.id[..8]
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
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

    /// Messages other than the seeded system prompt.
    pub fn transcript(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_system_prompt_only_when_present() {
        assert!(Conversation::with_system_prompt(None).is_empty());
        assert!(Conversation::with_system_prompt(Some("  ")).is_empty());
        let seeded = Conversation::with_system_prompt(Some("be brief"));
        assert_eq!(seeded.len(), 1);
        assert_eq!(seeded.messages()[0].role, Role::System);
        assert_eq!(seeded.transcript().count(), 0);
    }

    #[test]
    fn sessions_are_independent() {
        let mut a = Conversation::new();
        let b = Conversation::new();
        a.push(Message::user("hi"));
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.short_id().len(), 8);
    }
}
