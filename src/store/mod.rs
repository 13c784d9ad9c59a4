//! Durable key/value configuration storage.
//!
//! # Responsibilities
//! - Read every entry of the environment table in one call
//! - Look up a single entry by key code
//! - Bootstrap the table on an empty database
//!
//! # Design Decisions
//! - The cache only depends on the [`ConfigStore`] trait, not on Postgres
//! - An in-memory store serves seeded entries when no database is configured

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::environment::EnvironmentEntry;

pub use memory::MemoryConfigStore;
pub use postgres::PgConfigStore;

/// Errors from the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("no database URL configured (set database.url or DATABASE_URL)")]
    MissingUrl,
}

/// Source of truth for environment entries.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Every entry in the table.
    async fn fetch_all(&self) -> Result<Vec<EnvironmentEntry>, StoreError>;

    /// A single entry by key code.
    async fn find_by_key(&self, key_code: &str) -> Result<Option<EnvironmentEntry>, StoreError>;
}
