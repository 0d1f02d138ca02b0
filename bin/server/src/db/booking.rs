//! `BookingStore` backed by SQLite.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use foodiespot_booking::{
    BookingStore, NewReservation, NewRestaurant, Reservation, ReservationStatus, Restaurant,
    RestaurantFilter, StoreError,
};
use foodiespot_core::{ReservationId, RestaurantId};
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

/// Row type for restaurant queries.
#[derive(FromRow)]
struct RestaurantRow {
    id: i64,
    name: String,
    location: String,
    cuisine: String,
    capacity: i64,
    rating: f64,
}

impl TryFrom<RestaurantRow> for Restaurant {
    type Error = StoreError;

    fn try_from(row: RestaurantRow) -> Result<Self, Self::Error> {
        let capacity = u32::try_from(row.capacity).map_err(|_| StoreError::InvalidData {
            reason: format!("restaurant {} has invalid capacity {}", row.id, row.capacity),
        })?;
        Ok(Restaurant {
            id: RestaurantId::new(row.id),
            name: row.name,
            location: row.location,
            cuisine: row.cuisine,
            capacity,
            rating: row.rating,
        })
    }
}

/// Row type for reservation queries.
#[derive(FromRow)]
struct ReservationRow {
    id: i64,
    restaurant_id: i64,
    customer_name: String,
    party_size: i64,
    reserved_at: NaiveDateTime,
    status: String,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let party_size = u32::try_from(row.party_size).map_err(|_| StoreError::InvalidData {
            reason: format!(
                "reservation {} has invalid party size {}",
                row.id, row.party_size
            ),
        })?;
        Ok(Reservation {
            id: ReservationId::new(row.id),
            restaurant_id: RestaurantId::new(row.restaurant_id),
            customer_name: row.customer_name,
            party_size,
            reserved_at: row.reserved_at,
            status: row.status.parse()?,
        })
    }
}

fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() || db.is_check_violation() => {
            StoreError::ConstraintViolated {
                reason: db.message().to_string(),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::InvalidData {
            reason: err.to_string(),
        },
        other => StoreError::QueryFailed {
            reason: other.to_string(),
        },
    }
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Repository for restaurants and reservations.
///
/// Every operation is a single statement; SQLite commits each one on its own.
#[derive(Debug, Clone)]
pub struct SqliteBookingStore {
    pool: SqlitePool,
}

impl SqliteBookingStore {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    #[instrument(skip(self, restaurant), fields(name = %restaurant.name))]
    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, StoreError> {
        restaurant.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO restaurants (name, location, cuisine, capacity, rating)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&restaurant.name)
        .bind(&restaurant.location)
        .bind(&restaurant.cuisine)
        .bind(i64::from(restaurant.capacity))
        .bind(restaurant.rating)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(restaurant.into_restaurant(RestaurantId::new(result.last_insert_rowid())))
    }

    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, StoreError> {
        let row: Option<RestaurantRow> = sqlx::query_as(
            r#"
            SELECT id, name, location, cuisine, capacity, rating
            FROM restaurants
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(Restaurant::try_from).transpose()
    }

    async fn find_restaurants(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, StoreError> {
        let pattern = filter.cuisine.as_deref().map(like_pattern);
        let rows: Vec<RestaurantRow> = sqlx::query_as(
            r#"
            SELECT id, name, location, cuisine, capacity, rating
            FROM restaurants
            WHERE capacity >= ?
              AND (? IS NULL OR lower(cuisine) LIKE ? ESCAPE '\')
            ORDER BY id
            "#,
        )
        .bind(i64::from(filter.min_capacity))
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(Restaurant::try_from).collect()
    }

    async fn count_restaurants(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM restaurants")
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        u64::try_from(count).map_err(|_| StoreError::InvalidData {
            reason: format!("negative row count {count}"),
        })
    }

    async fn find_reservations(
        &self,
        restaurant_id: RestaurantId,
        at: NaiveDateTime,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(
            r#"
            SELECT id, restaurant_id, customer_name, party_size, reserved_at, status
            FROM reservations
            WHERE restaurant_id = ? AND reserved_at = ? AND status = ?
            ORDER BY id
            "#,
        )
        .bind(restaurant_id.get())
        .bind(at)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    #[instrument(skip(self, reservation), fields(restaurant_id = %reservation.restaurant_id))]
    async fn insert_reservation(
        &self,
        reservation: NewReservation,
    ) -> Result<Reservation, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO reservations (restaurant_id, customer_name, party_size, reserved_at, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(reservation.restaurant_id.get())
        .bind(&reservation.customer_name)
        .bind(i64::from(reservation.party_size))
        .bind(reservation.reserved_at)
        .bind(reservation.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(reservation.into_reservation(ReservationId::new(result.last_insert_rowid())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use chrono::NaiveDate;
    use foodiespot_booking::{book, check_availability, recommend};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid time")
    }

    async fn store() -> SqliteBookingStore {
        SqliteBookingStore::new(memory_pool().await)
    }

    #[tokio::test]
    async fn insert_and_get_restaurant() {
        let store = store().await;
        let inserted = store
            .insert_restaurant(NewRestaurant::new("Bella", "Zone 3", "Italian", 40, 4.2))
            .await
            .expect("insert");

        assert_eq!(inserted.id, RestaurantId::new(1));
        let fetched = store.get_restaurant(inserted.id).await.expect("get");
        assert_eq!(fetched, Some(inserted));
        assert_eq!(
            store.get_restaurant(RestaurantId::new(99)).await.expect("get"),
            None
        );
        assert_eq!(store.count_restaurants().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn find_restaurants_filters_in_storage_order() {
        let store = store().await;
        for (name, cuisine, capacity) in [
            ("A", "Italian", 10),
            ("B", "Mexican", 50),
            ("C", "Tex-Mex", 30),
            ("D", "mexican", 2),
        ] {
            store
                .insert_restaurant(NewRestaurant::new(name, "Zone 1", cuisine, capacity, 4.0))
                .await
                .expect("insert");
        }

        let filter = RestaurantFilter::seating(4).with_cuisine(Some("MEX"));
        let names: Vec<_> = store
            .find_restaurants(&filter)
            .await
            .expect("find")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["B", "C"]);

        let all = store
            .find_restaurants(&RestaurantFilter::seating(1))
            .await
            .expect("find");
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn cuisine_wildcards_match_literally() {
        let store = store().await;
        store
            .insert_restaurant(NewRestaurant::new("A", "Zone 1", "Italian", 10, 4.0))
            .await
            .expect("insert");

        let filter = RestaurantFilter::seating(1).with_cuisine(Some("%"));
        assert!(store.find_restaurants(&filter).await.expect("find").is_empty());
    }

    #[tokio::test]
    async fn reservation_round_trip_and_exact_slot_match() {
        let store = store().await;
        let restaurant = store
            .insert_restaurant(NewRestaurant::new("A", "Zone 1", "Italian", 4, 4.5))
            .await
            .expect("insert");

        let reservation = store
            .insert_reservation(NewReservation::confirmed(restaurant.id, "Ann", 4, at(19, 0)))
            .await
            .expect("insert reservation");
        assert_eq!(reservation.id, ReservationId::new(1));

        let found = store
            .find_reservations(restaurant.id, at(19, 0), ReservationStatus::Confirmed)
            .await
            .expect("find");
        assert_eq!(found, vec![reservation]);

        let other_minute = store
            .find_reservations(restaurant.id, at(19, 1), ReservationStatus::Confirmed)
            .await
            .expect("find");
        assert!(other_minute.is_empty());

        let cancelled = store
            .find_reservations(restaurant.id, at(19, 0), ReservationStatus::Cancelled)
            .await
            .expect("find");
        assert!(cancelled.is_empty());
    }

    #[tokio::test]
    async fn reservation_for_unknown_restaurant_is_rejected() {
        let store = store().await;
        let err = store
            .insert_reservation(NewReservation::confirmed(
                RestaurantId::new(7),
                "Ann",
                2,
                at(19, 0),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ConstraintViolated { .. }));
    }

    #[tokio::test]
    async fn cancelled_reservations_do_not_reduce_availability() {
        let store = store().await;
        let restaurant = store
            .insert_restaurant(NewRestaurant::new("A", "Zone 1", "Italian", 10, 4.5))
            .await
            .expect("insert");
        store
            .insert_reservation(NewReservation::confirmed(restaurant.id, "Ann", 3, at(19, 0)))
            .await
            .expect("confirmed");
        let cancelled = store
            .insert_reservation(NewReservation {
                status: ReservationStatus::Cancelled,
                ..NewReservation::confirmed(restaurant.id, "Bo", 6, at(19, 0))
            })
            .await
            .expect("cancelled");

        let stored = store
            .find_reservations(restaurant.id, at(19, 0), ReservationStatus::Cancelled)
            .await
            .expect("find");
        assert_eq!(stored, vec![cancelled]);

        let availability = check_availability(&store, restaurant.id, at(19, 0), 7)
            .await
            .expect("availability");
        assert_eq!(availability.available_seats, 10 - 3);
        assert!(availability.fits);
    }

    #[tokio::test]
    async fn tools_run_against_sqlite() {
        let store = store().await;
        let restaurant = store
            .insert_restaurant(NewRestaurant::new("A", "Zone 1", "Italian", 4, 4.5))
            .await
            .expect("insert");

        let summaries = recommend(&store, Some("italian"), 2).await.expect("recommend");
        assert_eq!(summaries.len(), 1);

        book(&store, restaurant.id, "Ann", at(19, 0), 4)
            .await
            .expect("book");
        let availability = check_availability(&store, restaurant.id, at(19, 0), 2)
            .await
            .expect("availability");
        assert_eq!(availability.available_seats, 0);
        assert!(!availability.fits);

        // Overbooking is not prevented.
        book(&store, restaurant.id, "Bo", at(19, 0), 2)
            .await
            .expect("book");
        let availability = check_availability(&store, restaurant.id, at(19, 0), 1)
            .await
            .expect("availability");
        assert_eq!(availability.available_seats, -2);
    }
}
