//! Message types for conversations.

use chrono::{DateTime, Utc};
use foodiespot_ai::{ChatMessage, FunctionCall};
use foodiespot_core::MessageId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
    /// Tool result message.
    Function,
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Message role.
    pub role: MessageRole,
    /// Message content. Serialized JSON for function results.
    pub content: String,
    /// Tool name, for function results.
    pub name: Option<String>,
    /// Tool invocation, for assistant messages that call a tool.
    pub function_call: Option<FunctionCall>,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            name: None,
            function_call: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Creates an assistant message recording the model's tool choice.
    #[must_use]
    pub fn function_intent(call: FunctionCall) -> Self {
        let mut msg = Self::new(MessageRole::Assistant, "");
        msg.function_call = Some(call);
        msg
    }

    /// Creates a tool result message.
    #[must_use]
    pub fn function_result(name: impl Into<String>, result: &JsonValue) -> Self {
        let mut msg = Self::new(MessageRole::Function, result.to_string());
        msg.name = Some(name.into());
        msg
    }

    /// Returns true if this message records a tool call.
    #[must_use]
    pub fn has_function_call(&self) -> bool {
        self.function_call.is_some()
    }

    /// Converts to the shape sent to the model.
    #[must_use]
    pub fn to_chat_message(&self) -> ChatMessage {
        match (self.role, &self.function_call) {
            (MessageRole::Assistant, Some(call)) => {
                ChatMessage::assistant_function_call(call.clone())
            }
            (MessageRole::Assistant, None) => ChatMessage::assistant(self.content.as_str()),
            (MessageRole::User, _) => ChatMessage::user(self.content.as_str()),
            (MessageRole::Function, _) => ChatMessage::function(
                self.name.clone().unwrap_or_default(),
                self.content.as_str(),
            ),
        }
    }
}
