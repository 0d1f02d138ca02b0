//! Chat-completion backend abstraction.
//!
//! A request carries the system prompt, the conversation so far and,
//! optionally, the function schemas the model may invoke. The model answers
//! with either plain text or a single function invocation.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions.
    System,
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
    /// Result of a function the assistant asked for.
    Function,
}

/// A function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The function name.
    pub name: String,
    /// Decoded argument object.
    pub arguments: JsonValue,
}

impl FunctionCall {
    /// Creates a new function call.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: JsonValue) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// A message sent to the model as conversation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: ChatRole,
    /// Text content. Absent on assistant messages that only carry a function call.
    pub content: Option<String>,
    /// Function name, for function-result messages.
    pub name: Option<String>,
    /// Function invocation, for assistant messages.
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(ChatRole::System, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(ChatRole::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(ChatRole::Assistant, content)
    }

    /// Creates an assistant message that invokes a function.
    #[must_use]
    pub fn assistant_function_call(call: FunctionCall) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    /// Creates a function-result message.
    #[must_use]
    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Function,
            content: Some(content.into()),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

/// A function the model may invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    /// Unique function name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for the argument object.
    pub parameters: JsonValue,
}

impl FunctionSchema {
    /// Creates a new function schema.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: JsonValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Whether the model may choose to call a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionMode {
    /// The model decides between text and a function call.
    #[default]
    Auto,
    /// The model must answer with text.
    None,
}

/// A request to a chat-completion model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// System prompt prepended to the conversation.
    pub system_prompt: String,
    /// Conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Functions the model may call. `None` forces a text answer.
    pub functions: Option<Vec<FunctionSchema>>,
    /// Function selection mode.
    pub function_mode: FunctionMode,
}

impl ChatRequest {
    /// Creates a request without functions.
    #[must_use]
    pub fn new(system_prompt: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages,
            functions: None,
            function_mode: FunctionMode::None,
        }
    }

    /// Offers functions to the model with automatic selection.
    #[must_use]
    pub fn with_functions(mut self, functions: Vec<FunctionSchema>) -> Self {
        self.functions = Some(functions);
        self.function_mode = FunctionMode::Auto;
        self
    }

    /// Returns true if the model is allowed to call a function.
    #[must_use]
    pub fn allows_function_call(&self) -> bool {
        self.function_mode == FunctionMode::Auto
            && self.functions.as_ref().is_some_and(|f| !f.is_empty())
    }
}

/// A reply from a chat-completion model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatReply {
    /// A direct text answer.
    Text { content: String },
    /// A request to invoke one function.
    FunctionCall(FunctionCall),
}

impl ChatReply {
    /// Creates a text reply.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Creates a function-call reply.
    #[must_use]
    pub fn function_call(name: impl Into<String>, arguments: JsonValue) -> Self {
        Self::FunctionCall(FunctionCall::new(name, arguments))
    }
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Sends the request and waits for the model's reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails or its reply cannot be decoded.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, LlmError>;

    /// Returns the model name.
    fn model(&self) -> &str;
}
