//! Error types for the AI crate.

use std::fmt;

/// Errors from chat-completion backend operations.
///
/// None of these are retried; the failed turn surfaces them as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The provider could not be reached.
    ProviderUnavailable { provider: String, reason: String },
    /// The provider answered with a non-success status.
    RequestFailed { reason: String },
    /// The reply body did not have the expected shape.
    ResponseParseFailed { reason: String },
    /// No reply within the configured timeout.
    Timeout,
    /// HTTP 429, with the `Retry-After` hint if one was sent.
    RateLimited { retry_after_secs: Option<u64> },
    /// The backend was configured with unusable settings.
    InvalidConfig { reason: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "model provider '{provider}' is unreachable: {reason}")
            }
            Self::RequestFailed { reason } => write!(f, "chat completion failed: {reason}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "unreadable chat completion reply: {reason}")
            }
            Self::Timeout => f.write_str("chat completion timed out"),
            Self::RateLimited {
                retry_after_secs: Some(secs),
            } => write!(f, "rate limited, retry after {secs}s"),
            Self::RateLimited {
                retry_after_secs: None,
            } => f.write_str("rate limited"),
            Self::InvalidConfig { reason } => write!(f, "invalid model backend settings: {reason}"),
        }
    }
}

impl std::error::Error for LlmError {}
