//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router from the registered routes
//! - Wire the request pipeline (real IP, proxy check, signing, scrubbing)
//! - Wire tower-http layers (tracing, request ID, CORS, timeout, body limit)
//! - Apply hot-reloaded runtime settings
//! - Serve until the shutdown broadcast fires

use std::net::SocketAddr;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::error::ApiError;
use crate::http::middleware::{
    cors::cors_layer, logger::logger_middleware, proxy_check::proxy_check_middleware,
    real_ip::real_ip_middleware, scrub::scrub_headers_middleware, signature::signature_middleware,
};
use crate::http::state::AppState;
use crate::routes;

/// HTTP server for the public API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        let mut updates_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => state.apply_config(&config),
                        None => break,
                    },
                    _ = updates_shutdown.recv() => break,
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn fallback() -> ApiError {
    ApiError::NotFound("no route for this path".to_string())
}

/// Build the public router with the full middleware stack.
///
/// Layers are listed innermost first.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    routes::router()
        .fallback(fallback)
        .layer(RequestBodyLimitLayer::new(config.headers.max_request_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn_with_state(state.clone(), signature_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), proxy_check_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), logger_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), real_ip_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), scrub_headers_middleware))
        .layer(cors_layer(&config.cors))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
