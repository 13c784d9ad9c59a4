//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers)
//!     → middleware/ (real IP, proxy check, logging, signing, scrubbing)
//!     → routes (handlers)
//!     → error.rs (structured JSON errors)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{build_router, HttpServer};
pub use state::{AppState, RuntimeSettings};
