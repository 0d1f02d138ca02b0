//! Restaurants, reservations and the booking tools for FoodieSpot.
//!
//! This crate provides:
//!
//! - **Model**: restaurant and reservation records
//! - **Store**: the `BookingStore` datastore trait and an in-memory implementation
//! - **Tools**: recommend, check availability and book

pub mod error;
pub mod memory;
pub mod model;
pub mod store;
pub mod tools;

pub use error::{BookingError, StoreError};
pub use memory::MemoryStore;
pub use model::{
    NewReservation, NewRestaurant, Reservation, ReservationStatus, Restaurant,
    parse_reservation_time,
};
pub use store::{BookingStore, RestaurantFilter};
pub use tools::{
    Availability, BookingConfirmation, RECOMMENDATION_LIMIT, RestaurantSummary, book,
    check_availability, recommend,
};
