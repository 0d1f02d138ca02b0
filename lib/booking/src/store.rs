//! Datastore boundary for restaurants and reservations.
//!
//! The core only reads, filters and inserts. Nothing updates or deletes a
//! record, and no operation takes a lock beyond its own statement.

use crate::error::StoreError;
use crate::model::{NewReservation, NewRestaurant, Reservation, ReservationStatus, Restaurant};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use foodiespot_core::RestaurantId;

/// Query parameters for restaurant lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestaurantFilter {
    /// Only restaurants with at least this capacity.
    pub min_capacity: u32,
    /// Case-insensitive substring of the cuisine.
    pub cuisine: Option<String>,
}

impl RestaurantFilter {
    /// Creates a filter for restaurants that can seat the party.
    #[must_use]
    pub fn seating(party_size: u32) -> Self {
        Self {
            min_capacity: party_size,
            cuisine: None,
        }
    }

    /// Narrows the filter to a cuisine. Blank input is ignored.
    #[must_use]
    pub fn with_cuisine(mut self, cuisine: Option<&str>) -> Self {
        self.cuisine = cuisine
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self
    }

    /// Returns true if the restaurant passes this filter.
    #[must_use]
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        if restaurant.capacity < self.min_capacity {
            return false;
        }
        match &self.cuisine {
            Some(cuisine) => restaurant
                .cuisine
                .to_lowercase()
                .contains(&cuisine.to_lowercase()),
            None => true,
        }
    }
}

/// Trait for restaurant and reservation storage.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Stores a restaurant and returns it with its assigned id.
    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, StoreError>;

    /// Gets a restaurant by id.
    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, StoreError>;

    /// Returns restaurants passing the filter, in storage order.
    async fn find_restaurants(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, StoreError>;

    /// Returns the number of stored restaurants.
    async fn count_restaurants(&self) -> Result<u64, StoreError>;

    /// Returns reservations at a restaurant for exactly this instant and status.
    async fn find_reservations(
        &self,
        restaurant_id: RestaurantId,
        at: NaiveDateTime,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Stores a reservation and returns it with its assigned id.
    async fn insert_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<Reservation, StoreError>;
}
