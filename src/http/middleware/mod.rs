//! Request pipeline middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → scrub.rs (on the way out: strip identifying headers)
//!     → real_ip.rs (PeerAddr, RealIp, rewritten ConnectInfo)
//!     → logger.rs (access log, optional bodies)
//!     → proxy_check.rs (403 for untrusted peers when enforced)
//!     → signature.rs (resolve keys, run handler, sign buffered body)
//!     → handler
//! ```
//! CORS, request IDs, tracing and timeouts are tower-http layers wired in
//! `http::server`.

pub mod cors;
pub mod logger;
pub mod proxy_check;
pub mod real_ip;
pub mod scrub;
pub mod signature;

pub use real_ip::{PeerAddr, RealIp};
