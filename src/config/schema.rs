//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the backend.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Database connection for the environment table.
    pub database: DatabaseConfig,

    /// Seed entries used when no database is configured.
    pub environment: EnvironmentConfig,

    /// Cross-origin resource sharing.
    pub cors: CorsConfig,

    /// Response signing settings.
    pub signing: SigningConfig,

    /// Header handling (real IP extraction, scrubbing).
    pub headers: HeaderConfig,

    /// Trusted reverse proxy resolution.
    pub trusted_proxy: TrustedProxyConfig,

    /// Firebase ID token verification.
    pub firebase: FirebaseConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection URL. Falls back to `DATABASE_URL` when unset.
    pub url: Option<String>,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection.
    pub acquire_timeout_secs: u64,

    /// Connection attempts at startup before giving up.
    pub connect_attempts: u32,

    /// Base delay for startup connection backoff in milliseconds.
    pub connect_base_delay_ms: u64,

    /// Maximum delay for startup connection backoff in milliseconds.
    pub connect_max_delay_ms: u64,

    /// Create the environment table on startup if missing.
    pub ensure_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            acquire_timeout_secs: 5,
            connect_attempts: 5,
            connect_base_delay_ms: 500,
            connect_max_delay_ms: 8000,
            ensure_schema: true,
        }
    }
}

/// In-config environment entries.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Entries served by the in-memory store when no database URL is set.
    pub seed: Vec<SeedEntry>,
}

/// A single seeded environment entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeedEntry {
    pub key_code: String,
    pub values: String,
    #[serde(default = "default_seed_author")]
    pub created_by: String,
}

fn default_seed_author() -> String {
    "config".to_string()
}

/// CORS configuration. `"*"` entries allow everything.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: vec!["*".to_string()],
            allow_headers: vec!["*".to_string()],
            allow_credentials: true,
        }
    }
}

/// Response signing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Largest response body the signer will buffer.
    pub max_body_bytes: usize,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Request and response header handling.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Forwarding headers consulted for the client IP, in priority order.
    pub real_ip_headers: Vec<String>,

    /// Headers removed from every response.
    pub remove_headers: Vec<String>,

    /// Largest request body accepted.
    pub max_request_body_bytes: usize,

    /// Log request bodies at debug level.
    pub log_request_body: bool,

    /// Log response bodies at debug level.
    pub log_response_body: bool,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            real_ip_headers: vec![
                "X-Forwarded-For".to_string(),
                "CF-Connecting-IP".to_string(),
                "True-Client-IP".to_string(),
            ],
            remove_headers: vec!["X-Uvicorn".to_string(), "Server".to_string()],
            max_request_body_bytes: 2 * 1024 * 1024, // 2MB
            log_request_body: false,
            log_response_body: false,
        }
    }
}

/// Trusted reverse proxy configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrustedProxyConfig {
    /// Reject requests whose immediate peer is not trusted.
    pub enforce: bool,

    /// Fetch the remote proxy range feed.
    pub fetch_feed: bool,

    /// IPv4 feed URL used when the environment table has no override.
    pub feed_url_v4: String,

    /// IPv6 feed URL used when the environment table has no override.
    pub feed_url_v6: String,

    /// Feed request timeout in seconds.
    pub feed_timeout_secs: u64,

    /// Discover the host's own interface addresses.
    pub include_local: bool,

    /// Extra IPs or CIDRs that are always trusted.
    pub static_proxies: Vec<String>,

    /// Minimum seconds between two rebuilds of the trusted set.
    pub min_refresh_interval_secs: u64,

    /// Active subnet probing (deprecated).
    pub probe: ProbeConfig,
}

impl Default for TrustedProxyConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            fetch_feed: true,
            feed_url_v4: "https://www.cloudflare.com/ips-v4".to_string(),
            feed_url_v6: "https://www.cloudflare.com/ips-v6".to_string(),
            feed_timeout_secs: 5,
            include_local: true,
            static_proxies: Vec::new(),
            min_refresh_interval_secs: 60,
            probe: ProbeConfig::default(),
        }
    }
}

/// Ping probe of local subnets.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub enabled: bool,

    /// Prefix length assumed for the local IPv4 subnet.
    pub prefix_len: u8,

    /// Per-host ping timeout in seconds.
    pub timeout_secs: u64,

    /// Concurrent pings in flight.
    pub concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix_len: 24,
            timeout_secs: 1,
            concurrency: 32,
        }
    }
}

/// Firebase authentication configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub enabled: bool,

    /// Firebase project id (token audience).
    pub project_id: String,

    /// JWK set endpoint for the signing keys.
    pub jwks_url: String,

    /// Minimum seconds between key set refetches.
    pub min_key_refresh_secs: u64,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: String::new(),
            jwks_url: "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
                .to_string(),
            min_key_refresh_secs: 60,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

/// Placeholder admin key rejected by validation.
pub const ADMIN_KEY_PLACEHOLDER: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: ADMIN_KEY_PLACEHOLDER.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
