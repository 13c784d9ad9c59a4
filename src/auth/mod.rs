//! Caller authentication.
//!
//! Only Firebase ID tokens are supported. The verifier is optional: when
//! `[firebase]` is disabled, protected routes answer `AUTH_DISABLED`.

pub mod firebase;

use thiserror::Error;

pub use firebase::{FirebaseClaims, FirebaseUser, FirebaseVerifier};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token signed with unknown key '{kid}'")]
    UnknownKey { kid: String },

    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(String),

    #[error("authentication disabled")]
    Disabled,
}

/// Token from an `Authorization: Bearer <token>` header value.
pub fn extract_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?.trim();
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_extracted() {
        assert_eq!(extract_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(extract_token(Some("bearer   abc")).unwrap(), "abc");
    }

    #[test]
    fn other_schemes_rejected() {
        assert!(matches!(extract_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(extract_token(Some("Basic dXNlcg==")), Err(AuthError::MissingToken)));
        assert!(matches!(extract_token(Some("Bearer ")), Err(AuthError::MissingToken)));
        assert!(matches!(extract_token(Some("token")), Err(AuthError::MissingToken)));
    }
}
