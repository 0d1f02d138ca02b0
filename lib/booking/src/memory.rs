//! In-memory `BookingStore`.
//!
//! Ids are assigned sequentially from 1, mirroring an autoincrement column.
//! Reservations referencing an unknown restaurant are rejected the way a
//! foreign key would reject them.

use crate::error::StoreError;
use crate::model::{NewReservation, NewRestaurant, Reservation, ReservationStatus, Restaurant};
use crate::store::{BookingStore, RestaurantFilter};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use foodiespot_core::{ReservationId, RestaurantId};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    restaurants: Vec<Restaurant>,
    reservations: Vec<Reservation>,
}

/// A `BookingStore` held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored reservation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `QueryFailed` if the store lock is poisoned.
    pub fn reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.lock()?.reservations.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|e| StoreError::QueryFailed {
            reason: format!("memory store lock poisoned: {e}"),
        })
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, StoreError> {
        restaurant.validate()?;
        let mut tables = self.lock()?;
        let id = RestaurantId::new(tables.restaurants.len() as i64 + 1);
        let restaurant = restaurant.into_restaurant(id);
        tables.restaurants.push(restaurant.clone());
        Ok(restaurant)
    }

    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, StoreError> {
        Ok(self
            .lock()?
            .restaurants
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn find_restaurants(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, StoreError> {
        Ok(self
            .lock()?
            .restaurants
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn count_restaurants(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.restaurants.len() as u64)
    }

    async fn find_reservations(
        &self,
        restaurant_id: RestaurantId,
        at: NaiveDateTime,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .lock()?
            .reservations
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id && r.reserved_at == at && r.status == status)
            .cloned()
            .collect())
    }

    async fn insert_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<Reservation, StoreError> {
        let mut tables = self.lock()?;
        if !tables
            .restaurants
            .iter()
            .any(|r| r.id == reservation.restaurant_id)
        {
            return Err(StoreError::ConstraintViolated {
                reason: format!("restaurant {} does not exist", reservation.restaurant_id),
            });
        }
        let id = ReservationId::new(tables.reservations.len() as i64 + 1);
        let reservation = reservation.into_reservation(id);
        tables.reservations.push(reservation.clone());
        Ok(reservation)
    }
}
