//! Chat-completion boundary for the FoodieSpot reservation assistant.
//!
//! This crate provides:
//!
//! - **Backend**: the request/reply shapes exchanged with a remote model and
//!   the `LlmBackend` trait that abstracts over providers
//! - **OpenAI**: an HTTP backend for OpenAI-compatible chat-completion APIs

pub mod backend;
pub mod error;
pub mod openai;

pub use backend::{
    ChatMessage, ChatReply, ChatRequest, ChatRole, FunctionCall, FunctionMode, FunctionSchema,
    LlmBackend,
};
pub use error::LlmError;
pub use openai::{OpenAiBackend, OpenAiConfig};
