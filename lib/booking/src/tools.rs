//! The three booking tools offered to the assistant.
//!
//! Each tool runs one or two datastore operations and returns a
//! serializable result that is handed back to the model verbatim.

use crate::error::BookingError;
use crate::model::{NewReservation, ReservationStatus, Restaurant};
use crate::store::{BookingStore, RestaurantFilter};
use chrono::NaiveDateTime;
use foodiespot_core::{ReservationId, RestaurantId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Maximum number of restaurants returned by [`recommend`].
pub const RECOMMENDATION_LIMIT: usize = 5;

/// Public view of a recommended restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSummary {
    pub id: RestaurantId,
    pub name: String,
    pub location: String,
    pub cuisine: String,
    pub rating: f64,
}

impl From<Restaurant> for RestaurantSummary {
    fn from(r: Restaurant) -> Self {
        Self {
            id: r.id,
            name: r.name,
            location: r.location,
            cuisine: r.cuisine,
            rating: r.rating,
        }
    }
}

/// Seats left at a restaurant for one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Capacity minus confirmed covers. Negative when already overbooked.
    pub available_seats: i64,
    /// Whether the requested party fits.
    pub fits: bool,
}

/// Outcome of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub reservation_id: ReservationId,
    pub status: ReservationStatus,
}

/// Returns up to five restaurants that can seat the party, best rated first.
///
/// Ties keep the datastore's order.
///
/// # Errors
///
/// Returns an error only if the datastore fails; no match is an empty list.
#[instrument(skip(store))]
pub async fn recommend(
    store: &dyn BookingStore,
    cuisine: Option<&str>,
    party_size: u32,
) -> Result<Vec<RestaurantSummary>, BookingError> {
    let filter = RestaurantFilter::seating(party_size).with_cuisine(cuisine);
    let mut candidates = store.find_restaurants(&filter).await?;

    candidates.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    candidates.truncate(RECOMMENDATION_LIMIT);

    debug!(matches = candidates.len(), "recommended restaurants");
    Ok(candidates.into_iter().map(RestaurantSummary::from).collect())
}

/// Computes the seats left at `at` and whether `party_size` fits.
///
/// Only confirmed reservations at exactly the same instant count.
///
/// # Errors
///
/// Returns `RestaurantNotFound` if the restaurant does not exist.
#[instrument(skip(store))]
pub async fn check_availability(
    store: &dyn BookingStore,
    restaurant_id: RestaurantId,
    at: NaiveDateTime,
    party_size: u32,
) -> Result<Availability, BookingError> {
    let restaurant = store
        .get_restaurant(restaurant_id)
        .await?
        .ok_or(BookingError::RestaurantNotFound { id: restaurant_id })?;

    let booked: i64 = store
        .find_reservations(restaurant_id, at, ReservationStatus::Confirmed)
        .await?
        .iter()
        .map(|r| i64::from(r.party_size))
        .sum();

    let available_seats = i64::from(restaurant.capacity) - booked;
    let availability = Availability {
        available_seats,
        fits: available_seats >= i64::from(party_size),
    };

    debug!(
        booked,
        available_seats,
        fits = availability.fits,
        "checked availability"
    );
    Ok(availability)
}

/// Inserts a confirmed reservation.
///
/// Capacity is not re-checked, so a booking past capacity succeeds.
///
/// # Errors
///
/// Returns an error if the datastore rejects the insert.
#[instrument(skip(store, customer_name))]
pub async fn book(
    store: &dyn BookingStore,
    restaurant_id: RestaurantId,
    customer_name: &str,
    at: NaiveDateTime,
    party_size: u32,
) -> Result<BookingConfirmation, BookingError> {
    let reservation = store
        .insert_reservation(NewReservation::confirmed(
            restaurant_id,
            customer_name,
            party_size,
            at,
        ))
        .await?;

    info!(
        reservation_id = %reservation.id,
        party_size,
        reserved_at = %reservation.reserved_at,
        "reservation confirmed"
    );
    Ok(BookingConfirmation {
        reservation_id: reservation.id,
        status: reservation.status,
    })
}
