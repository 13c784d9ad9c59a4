//! CORS layer built from `[cors]`.
//!
//! `"*"` allows everything. With credentials enabled a wildcard is answered by
//! mirroring the request, since browsers reject `*` alongside credentials.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;
use crate::http::middleware::signature::{X_PROJECT_ID, X_SIGNATURE, X_TIMESTAMP, X_VERSION};

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v == "*")
}

fn parse_all<T, E>(values: &[String], kind: &str, parse: impl Fn(&str) -> Result<T, E>) -> Vec<T> {
    values
        .iter()
        .filter_map(|v| match parse(v) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!(value = %v, kind, "Ignoring invalid CORS entry");
                None
            }
        })
        .collect()
}

pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let credentials = config.allow_credentials;

    let origin = match (is_wildcard(&config.allow_origins), credentials) {
        (true, true) => AllowOrigin::mirror_request(),
        (true, false) => AllowOrigin::from(Any),
        (false, _) => AllowOrigin::list(parse_all(&config.allow_origins, "origin", HeaderValue::from_str)),
    };

    let methods = match (is_wildcard(&config.allow_methods), credentials) {
        (true, true) => AllowMethods::mirror_request(),
        (true, false) => AllowMethods::from(Any),
        (false, _) => AllowMethods::from(parse_all(&config.allow_methods, "method", |m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
        })),
    };

    let headers = match (is_wildcard(&config.allow_headers), credentials) {
        (true, true) => AllowHeaders::mirror_request(),
        (true, false) => AllowHeaders::from(Any),
        (false, _) => AllowHeaders::from(parse_all(&config.allow_headers, "header", |h| {
            HeaderName::from_bytes(h.as_bytes())
        })),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(credentials)
        .expose_headers([X_SIGNATURE, X_TIMESTAMP, X_PROJECT_ID, X_VERSION])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn preflight(config: &CorsConfig) -> axum::response::Response {
        let app = Router::new()
            .route("/healthcheck", get(|| async { "ok" }))
            .layer(cors_layer(config));
        app.oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/healthcheck")
                .header("origin", "https://app.example.com")
                .header("access-control-request-method", "GET")
                .header("access-control-request-headers", "authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn wildcard_with_credentials_mirrors_origin() {
        let response = preflight(&CorsConfig::default()).await;
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "https://app.example.com");
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn explicit_origin_list() {
        let config = CorsConfig {
            allow_origins: vec!["https://app.example.com".into()],
            allow_methods: vec!["get".into(), "post".into()],
            allow_headers: vec!["authorization".into()],
            allow_credentials: false,
        };
        let response = preflight(&config).await;
        assert_eq!(response.headers()["access-control-allow-origin"], "https://app.example.com");
    }

    #[tokio::test]
    async fn wildcard_without_credentials_is_any() {
        let config = CorsConfig {
            allow_credentials: false,
            ..CorsConfig::default()
        };
        let response = preflight(&config).await;
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
