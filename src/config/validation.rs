//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and CIDR literals
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AppConfig, ADMIN_KEY_PLACEHOLDER};
use crate::security::cidr::IpCidr;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check the configuration, collecting every error found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.admin.enabled {
        check_socket_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() || config.admin.api_key == ADMIN_KEY_PLACEHOLDER {
            errors.push(ValidationError::new(
                "admin.api_key",
                "must be set to a non-placeholder value when admin is enabled",
            ));
        }
    }

    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let proxy = &config.trusted_proxy;
    if proxy.fetch_feed {
        check_url(&mut errors, "trusted_proxy.feed_url_v4", &proxy.feed_url_v4);
        check_url(&mut errors, "trusted_proxy.feed_url_v6", &proxy.feed_url_v6);
        if proxy.feed_timeout_secs == 0 {
            errors.push(ValidationError::new("trusted_proxy.feed_timeout_secs", "must be > 0"));
        }
    }
    for (i, literal) in proxy.static_proxies.iter().enumerate() {
        if let Err(e) = literal.parse::<IpCidr>() {
            errors.push(ValidationError::new(
                format!("trusted_proxy.static_proxies[{i}]"),
                e.to_string(),
            ));
        }
    }
    if proxy.probe.enabled {
        if !(16..=30).contains(&proxy.probe.prefix_len) {
            errors.push(ValidationError::new(
                "trusted_proxy.probe.prefix_len",
                "must be between 16 and 30",
            ));
        }
        if proxy.probe.concurrency == 0 {
            errors.push(ValidationError::new("trusted_proxy.probe.concurrency", "must be > 0"));
        }
    }

    if config.firebase.enabled {
        if config.firebase.project_id.is_empty() {
            errors.push(ValidationError::new(
                "firebase.project_id",
                "required when firebase is enabled",
            ));
        }
        check_url(&mut errors, "firebase.jwks_url", &config.firebase.jwks_url);
    }

    if config.signing.max_body_bytes == 0 {
        errors.push(ValidationError::new("signing.max_body_bytes", "must be > 0"));
    }
    if config.headers.max_request_body_bytes == 0 {
        errors.push(ValidationError::new("headers.max_request_body_bytes", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be > 0"));
    }

    for (i, seed) in config.environment.seed.iter().enumerate() {
        if seed.key_code.is_empty() || seed.key_code.len() > 50 {
            errors.push(ValidationError::new(
                format!("environment.seed[{i}].key_code"),
                "must be 1..=50 characters",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address '{value}'")));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    match url::Url::parse(value) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
        Ok(u) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", u.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {e}"))),
    }
}
