//! Response signing.
//!
//! # Responsibilities
//! - Resolve project id, version and secret from one cache snapshot before
//!   the handler runs; a missing key fails the request with 500
//! - Buffer the complete response body and sign it
//! - Attach `X-Signature`, `X-Timestamp`, `X-Project-ID` and `X-Version`
//!
//! # Design Decisions
//! - The signature covers the whole body, so streaming responses are
//!   materialized up to `signing.max_body_bytes`
//! - Keys are resolved per request; a reload is visible on the next request

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::environment::{EnvironmentError, EnvironmentKey, Snapshot};
use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::observability::metrics;
use crate::signing;

pub const X_SIGNATURE: HeaderName = HeaderName::from_static("x-signature");
pub const X_TIMESTAMP: HeaderName = HeaderName::from_static("x-timestamp");
pub const X_PROJECT_ID: HeaderName = HeaderName::from_static("x-project-id");
pub const X_VERSION: HeaderName = HeaderName::from_static("x-version");

/// Signing inputs resolved from the environment cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeys {
    pub project_id: String,
    pub version: String,
    pub secret: String,
}

impl SigningKeys {
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, EnvironmentError> {
        Ok(Self {
            project_id: snapshot.get(EnvironmentKey::ProjectId)?.to_string(),
            version: snapshot.get(EnvironmentKey::Version)?.to_string(),
            secret: snapshot.get(EnvironmentKey::Secret)?.to_string(),
        })
    }
}

/// Compute the signature for `body` and attach the signing headers.
pub fn apply_signature(headers: &mut HeaderMap, keys: &SigningKeys, timestamp: u64, body: &[u8]) -> Result<(), ApiError> {
    let text = signing::decode_utf8_ignoring_invalid(body);
    let signature = signing::sign(&keys.secret, &keys.project_id, &keys.version, timestamp, &text);

    let values = [
        (X_SIGNATURE, signature),
        (X_TIMESTAMP, timestamp.to_string()),
        (X_PROJECT_ID, signing::encode_base64(&keys.project_id)),
        (X_VERSION, signing::encode_base64(&keys.version)),
    ];
    for (name, value) in values {
        let value = HeaderValue::from_str(&value)
            .map_err(|e| ApiError::Internal(format!("invalid {name} header value: {e}")))?;
        headers.insert(name, value);
    }
    Ok(())
}

pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub async fn signature_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let snapshot = state.environment.snapshot();
    let keys = match SigningKeys::from_snapshot(&snapshot) {
        Ok(keys) => keys,
        Err(e) => {
            metrics::record_signing_failure("config_key_missing");
            return ApiError::from(e).into_response();
        }
    };
    drop(snapshot);

    let response = next.run(request).await;
    let timestamp = unix_timestamp();

    let limit = state.config.signing.max_body_bytes;
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, limit, "Failed to buffer response body for signing");
            metrics::record_signing_failure("body");
            return ApiError::ResponseTooLarge { limit }.into_response();
        }
    };

    if let Err(e) = apply_signature(&mut parts.headers, &keys, timestamp, &bytes) {
        metrics::record_signing_failure("header");
        return e.into_response();
    }

    metrics::record_signed();
    Response::from_parts(parts, Body::from(bytes))
}
