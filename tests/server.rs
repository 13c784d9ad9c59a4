//! End-to-end tests against a running server.

use std::time::Duration;

use signing_backend::http::HttpServer;
use signing_backend::lifecycle::Shutdown;
use signing_backend::signing;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

mod common;
use common::*;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn served_responses_are_signed_and_shut_down_cleanly() {
    let mut config = offline_config();
    config.trusted_proxy.enforce = true;
    let app = test_app(config, signing_entries()).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let (_updates_tx, updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(app.state);
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, updates, server_shutdown).await });

    // Loopback peers are always trusted.
    let res = client()
        .get(format!("http://{addr}/healthcheck"))
        .header("X-Forwarded-For", "203.0.113.5")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let timestamp: u64 = res.headers()["x-timestamp"].to_str().unwrap().parse().unwrap();
    let signature = res.headers()["x-signature"].to_str().unwrap().to_string();
    let body = res.text().await.unwrap();
    assert!(signing::verify(SECRET, PROJECT_ID, VERSION, timestamp, &body, &signature));

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "server did not stop after shutdown");
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = test_app(offline_config(), signing_entries()).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let (_updates_tx, updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(app.state);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { server.run(listener, updates, server_shutdown).await });

    let res = client()
        .request(reqwest::Method::OPTIONS, format!("http://{addr}/users"))
        .header("Origin", "https://app.example.com")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    assert_eq!(res.headers()["access-control-allow-origin"], "https://app.example.com");
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");

    shutdown.trigger();
}

#[tokio::test]
async fn config_updates_reach_the_running_server() {
    let app = test_app(offline_config(), signing_entries()).await;
    let state = app.state.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let shutdown = Shutdown::new();
    let (updates_tx, updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(app.state);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { server.run(listener, updates, server_shutdown).await });

    let mut updated = offline_config();
    updated.headers.remove_headers = vec!["X-Powered-By".to_string()];
    updated.trusted_proxy.enforce = true;
    updates_tx.send(updated).unwrap();

    let mut applied = false;
    for _ in 0..50 {
        if state.settings.load().enforce_trusted_proxy {
            applied = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(applied);
    assert_eq!(state.settings.load().remove_headers.len(), 1);

    shutdown.trigger();
}
