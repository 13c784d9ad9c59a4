//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT/SIGTERM trigger graceful shutdown
//! - SIGHUP reloads the environment cache without a restart

use std::sync::Arc;

use crate::environment::EnvironmentService;
use crate::lifecycle::Shutdown;

/// Listen for signals until shutdown.
pub fn spawn_signal_listener(shutdown: Shutdown, environment: Arc<EnvironmentService>) {
    tokio::spawn(async move {
        let mut stop = shutdown.subscribe();
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut terminate = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
            let mut hangup = signal(SignalKind::hangup()).expect("Failed to install SIGHUP handler");

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("SIGINT received, shutting down");
                        break;
                    }
                    _ = terminate.recv() => {
                        tracing::info!("SIGTERM received, shutting down");
                        break;
                    }
                    _ = hangup.recv() => {
                        tracing::info!("SIGHUP received, reloading environment cache");
                        reload(&environment).await;
                    }
                    _ = stop.recv() => return,
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = &environment;
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("Ctrl-C received, shutting down"),
                _ = stop.recv() => return,
            }
        }
        shutdown.trigger();
    });
}

async fn reload(environment: &EnvironmentService) {
    match environment.refresh_cache().await {
        Ok(entries) => tracing::info!(entries, "Environment cache reloaded"),
        Err(e) => tracing::warn!(error = %e, "Environment reload failed, keeping previous cache"),
    }
}
