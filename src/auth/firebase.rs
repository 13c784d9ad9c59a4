//! Firebase ID token verification.
//!
//! # Responsibilities
//! - Fetch Google's public signing keys (JWK set) and cache them by `kid`
//! - Verify signature, `exp`, `aud == project_id` and the Firebase issuer
//!
//! # Design Decisions
//! - The key cache is an `ArcSwap`; verification never holds a lock
//! - An unknown `kid` triggers one refetch, at most once per `min_key_refresh_secs`

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::config::FirebaseConfig;

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const KEY_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const NEVER: u64 = u64::MAX;

/// Claims carried by a Firebase ID token.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirebaseClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirebaseUser {
    pub uid: String,
    pub email: Option<String>,
}

type KeySet = HashMap<String, DecodingKey>;

pub struct FirebaseVerifier {
    project_id: String,
    issuer: String,
    algorithm: Algorithm,
    jwks_url: Option<String>,
    client: reqwest::Client,
    keys: ArcSwap<KeySet>,
    min_refresh: Duration,
    epoch: Instant,
    last_fetch_ms: AtomicU64,
}

impl FirebaseVerifier {
    /// Verifier backed by the configured JWK endpoint. Keys load lazily.
    pub fn new(config: &FirebaseConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(KEY_FETCH_TIMEOUT)
            .build()
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        Ok(Self {
            project_id: config.project_id.clone(),
            issuer: format!("{ISSUER_PREFIX}{}", config.project_id),
            algorithm: Algorithm::RS256,
            jwks_url: Some(config.jwks_url.clone()),
            client,
            keys: ArcSwap::from_pointee(KeySet::new()),
            min_refresh: Duration::from_secs(config.min_key_refresh_secs),
            epoch: Instant::now(),
            last_fetch_ms: AtomicU64::new(NEVER),
        })
    }

    /// Verifier with a fixed key set that never refetches.
    pub fn with_keys<I>(project_id: &str, algorithm: Algorithm, keys: I) -> Self
    where
        I: IntoIterator<Item = (String, DecodingKey)>,
    {
        Self {
            project_id: project_id.to_string(),
            issuer: format!("{ISSUER_PREFIX}{project_id}"),
            algorithm,
            jwks_url: None,
            client: reqwest::Client::new(),
            keys: ArcSwap::from_pointee(keys.into_iter().collect()),
            min_refresh: Duration::ZERO,
            epoch: Instant::now(),
            last_fetch_ms: AtomicU64::new(NEVER),
        }
    }

    /// Verify an ID token and return the caller it identifies.
    pub async fn verify(&self, token: &str) -> Result<FirebaseUser, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != self.algorithm {
            return Err(AuthError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing key id".to_string()))?;

        let key = match self.key_for(&kid) {
            Some(key) => key,
            None => {
                if self.jwks_url.is_some() {
                    self.refresh_keys().await?;
                }
                self.key_for(&kid).ok_or(AuthError::UnknownKey { kid })?
            }
        };

        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let claims = decode::<FirebaseClaims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(FirebaseUser {
            uid: claims.sub,
            email: claims.email,
        })
    }

    /// Refetch the JWK set. Returns the number of cached keys.
    pub async fn refresh_keys(&self) -> Result<usize, AuthError> {
        let Some(url) = self.jwks_url.as_deref() else {
            return Ok(self.keys.load().len());
        };
        if !self.claim_fetch_slot() {
            tracing::debug!("Skipping JWK refetch, last fetch too recent");
            return Ok(self.keys.load().len());
        }

        let set: JwkSet = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        let mut keys = KeySet::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => tracing::warn!(kid = %kid, error = %e, "Skipping unusable JWK"),
            }
        }

        let count = keys.len();
        self.keys.store(Arc::new(keys));
        tracing::info!(count, "Refreshed Firebase signing keys");
        Ok(count)
    }

    fn key_for(&self, kid: &str) -> Option<DecodingKey> {
        self.keys.load().get(kid).cloned()
    }

    fn claim_fetch_slot(&self) -> bool {
        let min_ms = self.min_refresh.as_millis() as u64;
        let now = self.epoch.elapsed().as_millis() as u64;
        let last = self.last_fetch_ms.load(Ordering::SeqCst);
        if last != NEVER && now.saturating_sub(last) < min_ms {
            return false;
        }
        self.last_fetch_ms
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"firebase-test-secret";
    const PROJECT: &str = "demo-project";

    fn verifier() -> FirebaseVerifier {
        FirebaseVerifier::with_keys(
            PROJECT,
            Algorithm::HS256,
            [("k1".to_string(), DecodingKey::from_secret(SECRET))],
        )
    }

    fn claims(aud: &str, iss: &str, exp_offset: i64) -> FirebaseClaims {
        let now = chrono::Utc::now().timestamp();
        FirebaseClaims {
            sub: "user-123".into(),
            aud: aud.into(),
            iss: iss.into(),
            exp: (now + exp_offset) as u64,
            iat: Some(now as u64),
            email: Some("user@example.com".into()),
        }
    }

    fn token(kid: &str, claims: &FirebaseClaims) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(kid.to_string());
        encode(&header, claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn issuer() -> String {
        format!("{ISSUER_PREFIX}{PROJECT}")
    }

    #[tokio::test]
    async fn valid_token_yields_user() {
        let t = token("k1", &claims(PROJECT, &issuer(), 3600));
        let user = verifier().verify(&t).await.unwrap();
        assert_eq!(user.uid, "user-123");
        assert_eq!(user.email.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn wrong_audience_rejected() {
        let t = token("k1", &claims("other-project", &issuer(), 3600));
        assert!(matches!(verifier().verify(&t).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn wrong_issuer_rejected() {
        let t = token("k1", &claims(PROJECT, "https://securetoken.google.com/other", 3600));
        assert!(matches!(verifier().verify(&t).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn expired_token_rejected() {
        let t = token("k1", &claims(PROJECT, &issuer(), -3600));
        assert!(matches!(verifier().verify(&t).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn unknown_kid_rejected() {
        let t = token("k2", &claims(PROJECT, &issuer(), 3600));
        assert!(matches!(verifier().verify(&t).await, Err(AuthError::UnknownKey { .. })));
    }

    #[tokio::test]
    async fn garbage_rejected() {
        assert!(matches!(verifier().verify("not-a-jwt").await, Err(AuthError::InvalidToken(_))));
    }
}
