//! Trusted proxy enforcement.
//!
//! Runs after real-IP extraction and checks the transport peer, not the
//! forwarded client address. Rejected requests never reach the handler.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::middleware::real_ip::{PeerAddr, UNKNOWN_PEER};
use crate::http::state::AppState;
use crate::observability::metrics;

pub async fn proxy_check_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.settings.load().enforce_trusted_proxy {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<PeerAddr>()
        .map(|PeerAddr(addr)| addr.ip())
        .unwrap_or(UNKNOWN_PEER.ip());

    if state.trusted_proxies.is_trusted(peer) {
        return next.run(request).await;
    }

    tracing::warn!(peer = %peer, uri = %request.uri(), "Rejected request from untrusted proxy");
    metrics::record_untrusted_proxy();
    ApiError::UntrustedProxy { peer }.into_response()
}
