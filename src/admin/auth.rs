use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::auth::extract_token;
use crate::http::{ApiError, AppState};

type HmacSha256 = Hmac<Sha256>;

const KEY_CHECK_MESSAGE: &[u8] = b"admin-api-key";

fn key_tag(key: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(KEY_CHECK_MESSAGE);
    mac
}

/// Constant-time key comparison: both keys are reduced to fixed-length tags
/// and checked with `verify_slice`.
fn keys_match(presented: &str, expected: &str) -> bool {
    let presented = key_tag(presented).finalize().into_bytes();
    key_tag(expected).verify_slice(&presented).is_ok()
}

pub async fn admin_auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let authorized = match extract_token(header) {
        Ok(token) => keys_match(token, &state.config.admin.api_key),
        Err(e) => return ApiError::from(e).into_response(),
    };

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(uri = %request.uri(), "Admin request with invalid API key");
    ApiError::Unauthorized("invalid admin API key".to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_exact_key_matches() {
        assert!(keys_match("s3cr3t-admin", "s3cr3t-admin"));
        assert!(!keys_match("s3cr3t-admi", "s3cr3t-admin"));
        assert!(!keys_match("s3cr3t-admin ", "s3cr3t-admin"));
        assert!(!keys_match("", "s3cr3t-admin"));
    }
}
