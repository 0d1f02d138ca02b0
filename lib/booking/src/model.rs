//! Restaurant and reservation records.

use crate::error::StoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use foodiespot_core::{ReservationId, RestaurantId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest rating a restaurant can carry.
pub const MAX_RATING: f64 = 5.0;

/// A restaurant that can take reservations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Restaurant ID.
    pub id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Zone label, e.g. "Zone 3".
    pub location: String,
    /// Cuisine category, e.g. "Italian".
    pub cuisine: String,
    /// Maximum simultaneous covers.
    pub capacity: u32,
    /// Rating between 0.0 and 5.0.
    pub rating: f64,
}

/// A restaurant that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    pub location: String,
    pub cuisine: String,
    pub capacity: u32,
    pub rating: f64,
}

impl NewRestaurant {
    /// Creates a new restaurant record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        cuisine: impl Into<String>,
        capacity: u32,
        rating: f64,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            cuisine: cuisine.into(),
            capacity,
            rating,
        }
    }

    /// Checks capacity and rating bounds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if capacity is zero or the rating is out of range.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.capacity == 0 {
            return Err(StoreError::InvalidData {
                reason: format!("restaurant '{}' must have a positive capacity", self.name),
            });
        }
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(StoreError::InvalidData {
                reason: format!(
                    "restaurant '{}' has rating {} outside 0.0-{MAX_RATING}",
                    self.name, self.rating
                ),
            });
        }
        Ok(())
    }

    /// Attaches the id assigned by the datastore.
    #[must_use]
    pub fn into_restaurant(self, id: RestaurantId) -> Restaurant {
        Restaurant {
            id,
            name: self.name,
            location: self.location,
            cuisine: self.cuisine,
            capacity: self.capacity,
            rating: self.rating,
        }
    }
}

/// The lifecycle state of a reservation.
///
/// Only `Confirmed` is ever written by the booking tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(StoreError::InvalidData {
                reason: format!("unknown reservation status '{other}'"),
            }),
        }
    }
}

/// A stored reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation ID.
    pub id: ReservationId,
    /// The restaurant being booked.
    pub restaurant_id: RestaurantId,
    /// Name the table is held under.
    pub customer_name: String,
    /// Number of covers.
    pub party_size: u32,
    /// The booked instant. There is no end time.
    pub reserved_at: NaiveDateTime,
    /// Lifecycle state.
    pub status: ReservationStatus,
}

/// A reservation that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub restaurant_id: RestaurantId,
    pub customer_name: String,
    pub party_size: u32,
    pub reserved_at: NaiveDateTime,
    pub status: ReservationStatus,
}

impl NewReservation {
    /// Creates a confirmed reservation request.
    #[must_use]
    pub fn confirmed(
        restaurant_id: RestaurantId,
        customer_name: impl Into<String>,
        party_size: u32,
        reserved_at: NaiveDateTime,
    ) -> Self {
        Self {
            restaurant_id,
            customer_name: customer_name.into(),
            party_size,
            reserved_at,
            status: ReservationStatus::Confirmed,
        }
    }

    /// Attaches the id assigned by the datastore.
    #[must_use]
    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            restaurant_id: self.restaurant_id,
            customer_name: self.customer_name,
            party_size: self.party_size,
            reserved_at: self.reserved_at,
            status: self.status,
        }
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 reservation time.
///
/// Accepts `YYYY-MM-DD[T| ]HH:MM[:SS[.fff]]`, a bare date (midnight), or an
/// RFC 3339 string whose offset is dropped. Returns `None` if nothing matches.
#[must_use]
pub fn parse_reservation_time(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
