//! Conversation engine for the FoodieSpot reservation assistant.
//!
//! This crate provides:
//!
//! - **Messages and sessions**: append-only, per-agent conversation history
//! - **Tool catalogue**: schemas offered to the model, typed argument parsing and dispatch
//! - **Reservation agent**: the turn loop that pairs the model with the booking tools

pub mod engine;
pub mod error;
pub mod message;
pub mod session;
pub mod tool;

pub use engine::{AgentConfig, DEFAULT_SYSTEM_PROMPT, ReservationAgent};
pub use error::{ConversationError, ToolError};
pub use message::{Message, MessageRole};
pub use session::Session;
pub use tool::{
    AvailabilityArgs, BookingArgs, RecommendArgs, ToolCall, ToolKind, dispatch, function_schemas,
};
