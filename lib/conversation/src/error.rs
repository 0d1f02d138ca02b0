//! Error types for the conversation crate.
//!
//! - `ToolError`: tool lookup, argument validation and execution
//! - `ConversationError`: a failed turn

use foodiespot_ai::LlmError;
use foodiespot_booking::BookingError;
use std::fmt;

/// Errors from tool dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The model named a tool outside the catalogue.
    UnknownTool { name: String },
    /// An argument is missing, of the wrong type, or out of range.
    InvalidArguments {
        tool: String,
        field: String,
        reason: String,
    },
    /// The tool ran and failed.
    Booking(BookingError),
    /// The tool result could not be encoded as JSON.
    ResultEncoding { tool: String, reason: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { name } => write!(f, "unknown tool: {name}"),
            Self::InvalidArguments {
                tool,
                field,
                reason,
            } => {
                write!(f, "invalid argument '{field}' for tool '{tool}': {reason}")
            }
            Self::Booking(err) => write!(f, "tool execution failed: {err}"),
            Self::ResultEncoding { tool, reason } => {
                write!(f, "failed to encode result of tool '{tool}': {reason}")
            }
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Booking(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BookingError> for ToolError {
    fn from(err: BookingError) -> Self {
        Self::Booking(err)
    }
}

/// Errors that fail a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// The remote model call failed.
    Remote(LlmError),
    /// Tool dispatch failed.
    Tool(ToolError),
    /// The model asked for a second tool in the same turn.
    UnexpectedFunctionCall { name: String },
}

impl ConversationError {
    /// Returns true if the failure came from the remote model.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::UnexpectedFunctionCall { .. })
    }
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(err) => write!(f, "model call failed: {err}"),
            Self::Tool(err) => write!(f, "{err}"),
            Self::UnexpectedFunctionCall { name } => {
                write!(f, "model requested a second tool call ('{name}') in one turn")
            }
        }
    }
}

impl std::error::Error for ConversationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Tool(err) => Some(err),
            Self::UnexpectedFunctionCall { .. } => None,
        }
    }
}

impl From<LlmError> for ConversationError {
    fn from(err: LlmError) -> Self {
        Self::Remote(err)
    }
}

impl From<ToolError> for ConversationError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodiespot_core::RestaurantId;

    #[test]
    fn invalid_arguments_display() {
        let err = ToolError::InvalidArguments {
            tool: "booking_tool".to_string(),
            field: "party_size".to_string(),
            reason: "must be a positive integer".to_string(),
        };
        assert!(err.to_string().contains("booking_tool"));
        assert!(err.to_string().contains("party_size"));
    }

    #[test]
    fn not_found_surfaces_through_turn_error() {
        let err = ConversationError::from(ToolError::from(BookingError::RestaurantNotFound {
            id: RestaurantId::new(5),
        }));
        assert!(err.to_string().contains("restaurant not found: 5"));
        assert!(!err.is_remote());
    }

    #[test]
    fn remote_errors_are_flagged() {
        assert!(ConversationError::from(LlmError::Timeout).is_remote());
    }
}
