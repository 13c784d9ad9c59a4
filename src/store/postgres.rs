//! Postgres-backed config store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::environment::EnvironmentEntry;
use crate::store::{ConfigStore, StoreError};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS environment_info (
    key_code VARCHAR(50) PRIMARY KEY,
    \"values\" VARCHAR(255) NOT NULL,
    created_by VARCHAR(50) NOT NULL,
    updated_by VARCHAR(50),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ DEFAULT now()
)";

// Timestamps are cast so tables created with plain TIMESTAMP columns decode too.
const SELECT_ALL: &str = "SELECT key_code, \"values\", created_by, updated_by,
    created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at
    FROM environment_info";

const SELECT_ONE: &str = "SELECT key_code, \"values\", created_by, updated_by,
    created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at
    FROM environment_info WHERE key_code = $1";

/// The `environment_info` table in Postgres.
#[derive(Clone)]
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    /// Open a connection pool using the configured URL.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config.url.as_deref().ok_or(StoreError::MissingUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::info!(max_connections = config.max_connections, "Database pool created");
        Ok(Self { pool })
    }

    /// Create the environment table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        tracing::debug!("environment_info table ensured");
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn fetch_all(&self) -> Result<Vec<EnvironmentEntry>, StoreError> {
        let entries = sqlx::query_as::<_, EnvironmentEntry>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        tracing::debug!(count = entries.len(), "Fetched environment entries");
        Ok(entries)
    }

    async fn find_by_key(&self, key_code: &str) -> Result<Option<EnvironmentEntry>, StoreError> {
        let entry = sqlx::query_as::<_, EnvironmentEntry>(SELECT_ONE)
            .bind(key_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        tracing::debug!(key_code = %key_code, found = entry.is_some(), "Looked up environment entry");
        Ok(entry)
    }
}

/// Connection-level failures are reported as unavailability.
fn map_sqlx(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
        other => StoreError::Query(other),
    }
}
