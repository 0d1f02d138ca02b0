//! Error types for the server binary.

use axum::http::StatusCode;
use foodiespot_conversation::ConversationError;
use std::fmt;

/// Errors that stop the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The database could not be opened.
    Database { details: String },
    /// A schema migration failed.
    Migration { details: String },
    /// Sample data could not be written.
    Seed { details: String },
    /// The model backend could not be built.
    Backend { details: String },
    /// The listener could not be bound or the server stopped.
    Serve { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Database { details } => write!(f, "failed to open database: {details}"),
            Self::Migration { details } => write!(f, "failed to run migrations: {details}"),
            Self::Seed { details } => write!(f, "failed to seed sample data: {details}"),
            Self::Backend { details } => write!(f, "failed to build model backend: {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Maps a failed turn to the response status.
///
/// Failures of the remote model are a bad gateway; everything else is ours.
#[must_use]
pub fn turn_status(err: &ConversationError) -> StatusCode {
    if err.is_remote() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Returns the notice shown to the user for a failed turn.
#[must_use]
pub fn turn_notice(err: &ConversationError) -> &'static str {
    match err {
        ConversationError::Remote(_) | ConversationError::UnexpectedFunctionCall { .. } => {
            "The assistant is unavailable right now. Please try again."
        }
        ConversationError::Tool(_) => "The assistant could not complete that request.",
    }
}
