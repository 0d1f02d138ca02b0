//! Conversation sessions.
//!
//! A session owns the message history of one conversation. History is
//! append-only and never truncated.

use crate::message::{Message, MessageRole};
use chrono::{DateTime, Utc};
use foodiespot_ai::ChatMessage;
use foodiespot_core::ConversationSessionId;
use serde::{Deserialize, Serialize};

/// A conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: ConversationSessionId,
    /// Messages in this session, oldest first.
    messages: Vec<Message>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last active.
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new, empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(ConversationSessionId::new())
    }

    /// Creates a new, empty session with a known id.
    #[must_use]
    pub fn with_id(id: ConversationSessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            created_at: now,
            last_active_at: now,
        }
    }

    /// Adds a message to the session.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.last_active_at = Utc::now();
    }

    /// Returns the history, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns the last message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the user-visible exchange: user lines and assistant text
    /// replies, without tool traffic.
    pub fn transcript(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| match m.role {
            MessageRole::User => true,
            MessageRole::Assistant => !m.has_function_call(),
            MessageRole::Function => false,
        })
    }

    /// Converts the history to the shape sent to the model.
    #[must_use]
    pub fn to_chat_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().map(Message::to_chat_message).collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodiespot_ai::FunctionCall;

    #[test]
    fn session_creation() {
        let session = Session::new();
        assert_eq!(session.message_count(), 0);
        assert!(session.last_message().is_none());
    }

    #[test]
    fn session_add_message() {
        let mut session = Session::new();
        session.add_message(Message::user("Hello!"));

        assert_eq!(session.message_count(), 1);
        assert_eq!(session.last_message().map(|m| m.content.as_str()), Some("Hello!"));
        assert!(session.last_active_at >= session.created_at);
    }

    #[test]
    fn transcript_hides_tool_traffic() {
        let mut session = Session::new();
        session.add_message(Message::user("Italian for two?"));
        session.add_message(Message::function_intent(FunctionCall::new(
            "recommend_restaurants",
            serde_json::json!({"party_size": 2}),
        )));
        session.add_message(Message::function_result(
            "recommend_restaurants",
            &serde_json::json!([]),
        ));
        session.add_message(Message::assistant("Nothing fits, sorry."));

        let roles: Vec<_> = session.transcript().map(|m| m.role).collect();
        assert_eq!(roles, [MessageRole::User, MessageRole::Assistant]);
        assert_eq!(session.to_chat_messages().len(), 4);
    }

    #[test]
    fn sessions_are_independent() {
        let mut a = Session::new();
        let b = Session::new();
        a.add_message(Message::user("hi"));

        assert_ne!(a.id, b.id);
        assert_eq!(b.message_count(), 0);
    }
}
