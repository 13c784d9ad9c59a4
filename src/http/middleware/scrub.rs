//! Removal of identifying response headers.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::state::AppState;

/// Strip the configured headers from every response, error responses included.
pub async fn scrub_headers_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let settings = state.settings.load();
    let headers = response.headers_mut();
    for name in &settings.remove_headers {
        headers.remove(name);
    }
    response
}
