//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Startup database connect:
//!     → attempt → on failure backoff.rs (exponential delay with jitter) → retry
//! ```
//!
//! # Design Decisions
//! - Retries are bounded by `database.connect_attempts`
//! - Jitter avoids replicas reconnecting in lockstep

pub mod backoff;
