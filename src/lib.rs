//! Signing backend library.
//!
//! Serves a small JSON API whose responses are signed with HMAC-SHA256 using
//! keys from a database-backed environment table.

pub mod admin;
pub mod auth;
pub mod config;
pub mod environment;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routes;
pub mod security;
pub mod signing;
pub mod store;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
