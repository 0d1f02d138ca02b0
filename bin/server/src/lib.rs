//! FoodieSpot web server.
//!
//! This crate wires the reservation agent to its collaborators: the
//! SQLite datastore, the OpenAI-compatible model backend, and a minimal
//! web form.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod seed;

use crate::app::AppState;
use crate::config::{LlmSettings, ServerConfig, SessionConfig};
use crate::db::SqliteBookingStore;
use crate::error::StartupError;
use foodiespot_ai::{OpenAiBackend, OpenAiConfig};
use foodiespot_conversation::AgentConfig;
use foodiespot_core::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds the model backend from configuration.
///
/// # Errors
///
/// Returns an error if the settings are rejected by the backend.
pub fn build_backend(settings: &LlmSettings) -> Result<OpenAiBackend, StartupError> {
    let mut config = OpenAiConfig::new(settings.base_url.clone(), settings.model.clone());
    if let Some(key) = &settings.api_key {
        config = config.with_api_key(key.clone());
    }
    if let Some(secs) = settings.timeout_secs {
        config = config.with_timeout_secs(secs);
    }

    let backend = OpenAiBackend::new(config).map_err(|e| StartupError::Backend {
        details: e.to_string(),
    })?;
    Ok(backend)
}

/// Opens the datastore, seeds it if configured, and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if any startup step fails or the server stops abnormally.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let pool = db::connect(&config.database_url).await?;
    let store = Arc::new(SqliteBookingStore::new(pool));

    if config.seed.enabled {
        seed::seed_restaurants(store.as_ref(), config.seed.restaurants).await?;
    }

    let backend = build_backend(&config.llm)?;
    info!(model = %config.llm.model, base_url = %config.llm.base_url, "using model backend");

    let state = Arc::new(AppState::new(
        Arc::new(backend),
        store,
        AgentConfig::default(),
    ));

    spawn_session_sweeper(state.clone(), &config.session);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| StartupError::Serve {
            details: format!("failed to bind {}: {e}", config.listen_addr),
        })?;
    info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Serve {
            details: e.to_string(),
        })?;
    Ok(())
}

/// Periodically drops conversation sessions that have gone idle.
fn spawn_session_sweeper(state: Arc<AppState>, config: &SessionConfig) {
    let max_idle = Duration::from_secs(config.idle_timeout_seconds);
    let every = Duration::from_secs(config.cleanup_interval_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            state.evict_idle(max_idle).await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
