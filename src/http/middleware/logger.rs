//! Request/response logging.
//!
//! Every request gets one info line with method, URI, client, status and
//! latency. Bodies are logged at debug only when enabled in `[headers]`.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::middleware::real_ip::RealIp;
use crate::http::state::AppState;
use crate::observability::metrics;

/// Characters of a body included in a log line.
const BODY_PREVIEW_CHARS: usize = 1024;

fn preview(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).chars().take(BODY_PREVIEW_CHARS).collect()
}

pub async fn logger_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let settings = state.settings.load_full();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client = request
        .extensions()
        .get::<RealIp>()
        .map(|RealIp(ip)| ip.to_string())
        .unwrap_or_else(|| "-".to_string());

    let request = if settings.log_request_body {
        let limit = state.config.headers.max_request_body_bytes;
        let (parts, body) = request.into_parts();
        match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => {
                tracing::debug!(method = %method, uri = %uri, body = %preview(&bytes), "Request body");
                Request::from_parts(parts, Body::from(bytes))
            }
            Err(_) => {
                let response = ApiError::PayloadTooLarge { limit }.into_response();
                tracing::info!(method = %method, uri = %uri, client = %client, status = 413, "Request rejected");
                return response;
            }
        }
    } else {
        request
    };

    let mut response = next.run(request).await;

    if settings.log_response_body {
        let limit = state.config.signing.max_body_bytes;
        let (parts, body) = response.into_parts();
        response = match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => {
                tracing::debug!(method = %method, uri = %uri, body = %preview(&bytes), "Response body");
                Response::from_parts(parts, Body::from(bytes))
            }
            Err(_) => ApiError::ResponseTooLarge { limit }.into_response(),
        };
    }

    let status = response.status().as_u16();
    tracing::info!(
        method = %method,
        uri = %uri,
        client = %client,
        status,
        latency_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(method.as_str(), status, start);

    response
}
