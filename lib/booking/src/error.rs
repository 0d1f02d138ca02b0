//! Error types for the booking crate.

use foodiespot_core::RestaurantId;
use std::fmt;

/// Errors from datastore operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A query or statement failed to execute.
    QueryFailed { reason: String },
    /// A write was rejected by a constraint (e.g. unknown restaurant).
    ConstraintViolated { reason: String },
    /// A stored or submitted value is invalid.
    InvalidData { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed { reason } => write!(f, "datastore query failed: {reason}"),
            Self::ConstraintViolated { reason } => {
                write!(f, "datastore constraint violated: {reason}")
            }
            Self::InvalidData { reason } => write!(f, "invalid datastore data: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from the booking tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// The referenced restaurant does not exist.
    RestaurantNotFound { id: RestaurantId },
    /// The datastore failed.
    Store(StoreError),
}

impl fmt::Display for BookingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestaurantNotFound { id } => write!(f, "restaurant not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for BookingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::RestaurantNotFound { .. } => None,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
