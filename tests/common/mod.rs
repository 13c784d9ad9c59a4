//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response},
};
use signing_backend::auth::FirebaseVerifier;
use signing_backend::config::AppConfig;
use signing_backend::environment::{EnvironmentEntry, EnvironmentKey, EnvironmentService};
use signing_backend::http::AppState;
use signing_backend::security::TrustedProxyResolver;
use signing_backend::store::MemoryConfigStore;

pub const PROJECT_ID: &str = "P1";
pub const VERSION: &str = "1.0";
pub const SECRET: &str = "s3cr3t";

pub fn entry(key: EnvironmentKey, values: &str) -> EnvironmentEntry {
    EnvironmentEntry::new(key.code(), values, "test")
}

/// Project id, version and secret.
pub fn signing_entries() -> Vec<EnvironmentEntry> {
    vec![
        entry(EnvironmentKey::ProjectId, PROJECT_ID),
        entry(EnvironmentKey::Version, VERSION),
        entry(EnvironmentKey::Secret, SECRET),
    ]
}

/// Defaults with every network-dependent trust source disabled.
pub fn offline_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.trusted_proxy.fetch_feed = false;
    config.trusted_proxy.include_local = false;
    config.admin.api_key = "test-admin-key".to_string();
    config
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryConfigStore>,
}

pub async fn test_app(config: AppConfig, entries: Vec<EnvironmentEntry>) -> TestApp {
    test_app_with_firebase(config, entries, None).await
}

pub async fn test_app_with_firebase(
    config: AppConfig,
    entries: Vec<EnvironmentEntry>,
    firebase: Option<FirebaseVerifier>,
) -> TestApp {
    let store = Arc::new(MemoryConfigStore::new(entries));
    let environment = Arc::new(EnvironmentService::new(store.clone()));
    environment.refresh_cache().await.unwrap();

    let resolver = Arc::new(
        TrustedProxyResolver::new(config.trusted_proxy.clone(), environment.clone()).unwrap(),
    );
    resolver.initialize().await;

    let state = AppState::new(config, environment, resolver, firebase.map(Arc::new));
    TestApp { state, store }
}

/// Request arriving from `peer`.
pub fn request_from(peer: &str, method: &str, uri: &str) -> axum::http::request::Builder {
    let addr: SocketAddr = peer.parse().unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(addr))
}

pub fn get(uri: &str) -> Request<Body> {
    request_from("127.0.0.1:40000", "GET", uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
