//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Connect store (with backoff) → Ensure schema → Load cache
//!     → Build trusted proxy set → Ready to bind listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Listeners drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Reload the environment cache
//! ```
//!
//! # Design Decisions
//! - Ordered startup: store first, then cache, then trust set, then listeners
//! - A cache that cannot be loaded at startup is fatal; later reload
//!   failures keep the previous snapshot

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, StartupError};
