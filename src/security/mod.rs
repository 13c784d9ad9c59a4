//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Startup / admin trigger:
//!     feed.rs (remote ranges) + local.rs (host addresses)
//!     + static config + probe.rs (optional ping scan)
//!     → trusted_proxy.rs builds TrustedProxySet
//!     → ArcSwap publishes it
//!
//! Incoming request:
//!     → http::middleware::proxy_check consults the current set (no I/O)
//! ```
//!
//! # Design Decisions
//! - Fail closed: an untrusted peer is rejected when enforcement is on
//! - Fail soft while building: any source may be missing
//! - Never rebuilt on the request path

pub mod cidr;
pub mod feed;
pub mod local;
pub mod probe;
pub mod trusted_proxy;

use thiserror::Error;

pub use cidr::IpCidr;
pub use trusted_proxy::{TrustedProxyResolver, TrustedProxySet};

/// Errors from trust set construction.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("trust source '{source_name}' failed: {message}")]
    SourceFetchFailed { source_name: String, message: String },

    #[error("trusted proxy refresh rate limited, retry in {retry_after_secs}s")]
    RefreshRateLimited { retry_after_secs: u64 },
}
