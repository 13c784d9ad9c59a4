//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect the config store (Postgres with backoff, or the seeded memory store)
//! - Bootstrap the environment table
//! - Load the environment cache
//! - Build the first trusted proxy set
//! - Create the Firebase verifier when enabled
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthError, FirebaseVerifier};
use crate::config::{AppConfig, DatabaseConfig};
use crate::environment::{EnvironmentError, EnvironmentService};
use crate::http::AppState;
use crate::resilience::backoff::calculate_backoff;
use crate::security::{TrustError, TrustedProxyResolver};
use crate::store::{ConfigStore, MemoryConfigStore, PgConfigStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("config store: {0}")]
    Store(#[from] StoreError),

    #[error("initial environment load failed: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("trusted proxy resolver: {0}")]
    Trust(#[from] TrustError),

    #[error("firebase: {0}")]
    Auth(#[from] AuthError),
}

/// Bring every subsystem up and return the shared state.
pub async fn bootstrap(config: AppConfig) -> Result<AppState, StartupError> {
    let store = open_store(&config).await?;
    let environment = Arc::new(EnvironmentService::new(store));

    let entries = environment.refresh_cache().await?;
    tracing::info!(entries, "Environment cache loaded");

    let resolver = Arc::new(TrustedProxyResolver::new(
        config.trusted_proxy.clone(),
        environment.clone(),
    )?);
    let trusted = resolver.initialize().await;
    tracing::info!(
        trusted,
        enforce = config.trusted_proxy.enforce,
        "Trusted proxy set ready"
    );

    let firebase = if config.firebase.enabled {
        let verifier = FirebaseVerifier::new(&config.firebase)?;
        if let Err(e) = verifier.refresh_keys().await {
            tracing::warn!(error = %e, "Firebase keys not loaded yet, will retry on first token");
        }
        Some(Arc::new(verifier))
    } else {
        None
    };

    Ok(AppState::new(config, environment, resolver, firebase))
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn ConfigStore>, StartupError> {
    if config.database.url.is_none() {
        tracing::warn!(
            seeded = config.environment.seed.len(),
            "No database URL configured, serving seeded in-memory environment"
        );
        return Ok(Arc::new(MemoryConfigStore::from_seed(&config.environment.seed)));
    }

    let store = connect_with_backoff(&config.database).await?;
    if config.database.ensure_schema {
        store.ensure_schema().await?;
    }
    Ok(Arc::new(store))
}

/// Connect to Postgres, retrying with jittered exponential backoff.
pub async fn connect_with_backoff(config: &DatabaseConfig) -> Result<PgConfigStore, StoreError> {
    let attempts = config.connect_attempts.max(1);
    let mut attempt = 1;
    loop {
        match PgConfigStore::connect(config).await {
            Ok(store) => return Ok(store),
            Err(StoreError::MissingUrl) => return Err(StoreError::MissingUrl),
            Err(e) if attempt < attempts => {
                let delay = calculate_backoff(attempt, config.connect_base_delay_ms, config.connect_max_delay_ms);
                tracing::warn!(attempt, delay = ?delay, error = %e, "Database connect failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempts, error = %e, "Database connect failed, giving up");
                return Err(e);
            }
        }
    }
}
