//! Signing backend.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ tower-http (trace, request id, CORS)
//!                        → scrub → real IP → logger → proxy check
//!                        → signature ──▶ routes (healthcheck, reload, users)
//!                                          │
//!                                          ▼
//!                             environment cache (ArcSwap snapshot)
//!                                          ▲
//!                                          │ refresh (startup, /reload,
//!                                          │   admin API, SIGHUP)
//!                                   config store (Postgres / seeded memory)
//!
//!     Cross-cutting: config (TOML + watcher), observability (tracing,
//!     Prometheus), lifecycle (startup, signals, shutdown), security
//!     (trusted proxy set), admin API
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use signing_backend::admin::serve_admin;
use signing_backend::config::loader::{load_config, parse_config};
use signing_backend::config::watcher::ConfigWatcher;
use signing_backend::http::HttpServer;
use signing_backend::lifecycle::{bootstrap, signals::spawn_signal_listener, Shutdown};
use signing_backend::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "signing-backend", version, about = "Web backend with HMAC-signed responses")]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => parse_config("")?,
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "signing-backend starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = config.database.url.is_some(),
        enforce_trusted_proxy = config.trusted_proxy.enforce,
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = bootstrap(config.clone()).await?;

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone(), state.environment.clone());

    // The watcher handle must outlive the server.
    let (_watcher, _updates_tx, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.run()?), None, rx)
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (None, Some(tx), rx)
        }
    };

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let admin_state = state.clone();
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = serve_admin(listener, admin_state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(state);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
