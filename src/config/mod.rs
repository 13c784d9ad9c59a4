//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → watcher.rs reports edits that need a restart
//!     → server swaps the runtime-adjustable settings
//! ```
//!
//! This is the static, file-based configuration. The dynamic key/value
//! configuration read from the database lives in [`crate::environment`].

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, CorsConfig, DatabaseConfig, FirebaseConfig, HeaderConfig,
    ListenerConfig, ObservabilityConfig, ProbeConfig, SeedEntry, SigningConfig, TimeoutConfig,
    TrustedProxyConfig,
};
