//! SQLite persistence for restaurants and reservations.

pub mod booking;

pub use booking::SqliteBookingStore;

use crate::error::StartupError;
use foodiespot_core::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Opens a pool on `database_url` and applies the embedded migrations.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub async fn connect(database_url: &str) -> Result<SqlitePool, StartupError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StartupError::Database {
            details: format!("invalid database url: {e}"),
        })?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StartupError::Database {
            details: e.to_string(),
        })?;
    tracing::info!("Database connection established");

    migrate(&pool).await?;
    tracing::info!("Database migrations applied");
    Ok(pool)
}

/// Applies the embedded migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StartupError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StartupError::Migration {
            details: e.to_string(),
        })?;
    Ok(())
}

/// Opens a migrated single-connection in-memory database.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("in-memory url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("open in-memory database");
    migrate(&pool).await.expect("migrate in-memory database");
    pool
}
