//! Dynamic environment configuration.
//!
//! # Data Flow
//! ```text
//! environment_info table (ConfigStore)
//!     → service.rs refresh_cache() (startup, /reload, SIGHUP)
//!     → cache.rs builds a new Snapshot
//!     → ArcSwap publishes it
//!     → request path reads Snapshot (no I/O)
//! ```

pub mod cache;
pub mod entry;
pub mod keys;
pub mod service;

use thiserror::Error;

use crate::store::StoreError;

pub use cache::{EnvironmentCache, Snapshot};
pub use entry::EnvironmentEntry;
pub use keys::EnvironmentKey;
pub use service::EnvironmentService;

/// Errors from environment lookups and refreshes.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("environment key '{key_code}' not found in cache")]
    NotFound { key_code: String },

    #[error("environment key '{key_code}' has an empty value")]
    EmptyValue { key_code: String },

    #[error("environment table is empty")]
    Empty,

    #[error("config store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl EnvironmentError {
    /// Key code involved, if any.
    pub fn key_code(&self) -> Option<&str> {
        match self {
            EnvironmentError::NotFound { key_code } | EnvironmentError::EmptyValue { key_code } => {
                Some(key_code)
            }
            _ => None,
        }
    }
}
