//! Structured API errors.
//!
//! Every error leaving the pipeline has the same JSON shape:
//! `{"code": "...", "error": "...", "details": ..., "hint": ...}`.
//! Server-side failures are logged here and never echo internal error text.

use std::net::IpAddr;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::environment::{EnvironmentError, EnvironmentKey};
use crate::security::TrustError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration store unavailable")]
    StoreUnavailable,

    #[error("required configuration key {key_code} is missing")]
    ConfigKeyMissing { key_code: String },

    #[error("request did not arrive through a trusted proxy")]
    UntrustedProxy { peer: IpAddr },

    #[error("response body too large to sign")]
    ResponseTooLarge { limit: usize },

    #[error("request body too large")]
    PayloadTooLarge { limit: usize },

    #[error("unauthorized")]
    Unauthorized(String),

    #[error("authentication is not configured")]
    AuthDisabled,

    #[error("not found")]
    NotFound(String),

    #[error("too many requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("internal server error")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub error: String,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::StoreUnavailable | ApiError::AuthDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ConfigKeyMissing { .. }
            | ApiError::ResponseTooLarge { .. }
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UntrustedProxy { .. } => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::StoreUnavailable => "STORE_UNAVAILABLE",
            ApiError::ConfigKeyMissing { .. } => "CONFIG_KEY_MISSING",
            ApiError::UntrustedProxy { .. } => "UNTRUSTED_PROXY",
            ApiError::ResponseTooLarge { .. } => "RESPONSE_TOO_LARGE",
            ApiError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::AuthDisabled => "AUTH_DISABLED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (details, hint) = match self {
            ApiError::StoreUnavailable => (
                None,
                Some("The environment table could not be read; cached values are still served".to_string()),
            ),
            ApiError::ConfigKeyMissing { key_code } => {
                let name = EnvironmentKey::from_code(key_code)
                    .map(|key| key.name())
                    .unwrap_or("UNKNOWN");
                (
                    Some(format!("{name} ({key_code}) has no value in environment_info")),
                    Some("Insert the key into environment_info and trigger a reload".to_string()),
                )
            }
            ApiError::UntrustedProxy { peer } => (Some(format!("peer {peer} is not trusted")), None),
            ApiError::ResponseTooLarge { limit } => (Some(format!("limit is {limit} bytes")), None),
            ApiError::PayloadTooLarge { limit } => (Some(format!("limit is {limit} bytes")), None),
            ApiError::Unauthorized(reason) => (
                Some(reason.clone()),
                Some("Send 'Authorization: Bearer <token>'".to_string()),
            ),
            ApiError::AuthDisabled => (None, Some("Enable [firebase] in the configuration".to_string())),
            ApiError::NotFound(what) => (Some(what.clone()), None),
            ApiError::RateLimited { retry_after_secs } => {
                (Some(format!("retry in {retry_after_secs}s")), None)
            }
            ApiError::Internal(_) => (None, None),
        };

        ErrorBody {
            code: self.code(),
            error: self.to_string(),
            details,
            hint,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                ApiError::Internal(message) => {
                    tracing::error!(code = self.code(), error = %message, "Request failed")
                }
                _ => tracing::error!(code = self.code(), error = %self, "Request failed"),
            }
        }

        let retry_after = match &self {
            ApiError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let mut response = (status, Json(self.body())).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<EnvironmentError> for ApiError {
    fn from(err: EnvironmentError) -> Self {
        match err {
            EnvironmentError::NotFound { key_code } | EnvironmentError::EmptyValue { key_code } => {
                ApiError::ConfigKeyMissing { key_code }
            }
            EnvironmentError::Empty => ApiError::NotFound("environment table is empty".to_string()),
            EnvironmentError::StoreUnavailable(e) => {
                tracing::warn!(error = %e, "Config store unavailable");
                ApiError::StoreUnavailable
            }
        }
    }
}

impl From<TrustError> for ApiError {
    fn from(err: TrustError) -> Self {
        match err {
            TrustError::RefreshRateLimited { retry_after_secs } => ApiError::RateLimited { retry_after_secs },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Disabled => ApiError::AuthDisabled,
            AuthError::KeyFetch(message) => ApiError::Internal(message),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn json_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_key_names_the_key() {
        let response = ApiError::from(EnvironmentError::NotFound {
            key_code: "10000003".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_of(response).await;
        assert_eq!(body["code"], "CONFIG_KEY_MISSING");
        assert!(body["details"].as_str().unwrap().contains("SECRET"));
        assert!(body["hint"].is_string());
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let response = ApiError::Internal("connection refused at 10.0.0.3".into()).into_response();
        let body = json_of(response).await;
        assert_eq!(body["code"], "INTERNAL");
        assert!(body["details"].is_null());
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn rate_limit_sets_retry_after() {
        let response = ApiError::from(TrustError::RefreshRateLimited { retry_after_secs: 42 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn empty_table_is_not_found() {
        let err = ApiError::from(EnvironmentError::Empty);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
