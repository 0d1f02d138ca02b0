//! Core domain types for the FoodieSpot reservation assistant.
//!
//! This crate provides the identifiers and the error-handling foundation
//! shared by the booking, conversation and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationSessionId, MessageId, ParseIdError, ReservationId, RestaurantId};
