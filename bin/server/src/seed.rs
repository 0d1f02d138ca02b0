//! Sample restaurant data for an empty database.

use crate::error::StartupError;
use fake::Fake;
use fake::faker::company::en::CompanyName;
use foodiespot_booking::{BookingStore, NewRestaurant};
use foodiespot_core::Result;
use rand::Rng;
use tracing::{info, instrument};

/// Cuisines assigned to generated restaurants.
pub const CUISINES: [&str; 6] = ["Italian", "Indian", "Chinese", "Mexican", "Japanese", "French"];

/// Number of generated zones (`Zone 1` to `Zone 10`).
pub const ZONES: u32 = 10;

/// Generates one restaurant.
pub fn sample_restaurant(rng: &mut impl Rng) -> NewRestaurant {
    let name: String = CompanyName().fake();
    let location = format!("Zone {}", rng.random_range(1..=ZONES));
    let cuisine = CUISINES[rng.random_range(0..CUISINES.len())];
    let capacity = rng.random_range(20..=100);
    let rating = (rng.random_range(3.5..=5.0_f64) * 10.0).round() / 10.0;

    NewRestaurant::new(name, location, cuisine, capacity, rating)
}

/// Inserts `count` generated restaurants if the store has none.
///
/// Returns how many were inserted.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
#[instrument(skip(store))]
pub async fn seed_restaurants(store: &dyn BookingStore, count: u32) -> Result<u32, StartupError> {
    let existing = store
        .count_restaurants()
        .await
        .map_err(|e| StartupError::Seed {
            details: e.to_string(),
        })?;
    if existing > 0 {
        info!(existing, "restaurants already present, skipping seed");
        return Ok(0);
    }

    let mut rng = rand::rng();
    for _ in 0..count {
        store
            .insert_restaurant(sample_restaurant(&mut rng))
            .await
            .map_err(|e| StartupError::Seed {
                details: e.to_string(),
            })?;
    }

    info!(count, "seeded sample restaurants");
    Ok(count)
}
