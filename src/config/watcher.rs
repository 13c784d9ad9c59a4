//! Configuration file watcher for hot reload.
//!
//! A running server only picks up the settings carried by
//! [`RuntimeSettings`](crate::http::RuntimeSettings): the forwarding and
//! removed header lists, the body logging toggles and
//! `trusted_proxy.enforce`. Edits anywhere else are reported and take effect
//! on the next restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{AppConfig, TrustedProxyConfig};

/// Sections (or parts of sections) of `reloaded` that differ from the
/// running configuration and cannot be applied without a restart.
pub fn restart_required(running: &AppConfig, reloaded: &AppConfig) -> Vec<&'static str> {
    let reloaded_trust = TrustedProxyConfig {
        enforce: running.trusted_proxy.enforce,
        ..reloaded.trusted_proxy.clone()
    };

    [
        ("listener", running.listener != reloaded.listener),
        ("database", running.database != reloaded.database),
        ("environment", running.environment != reloaded.environment),
        ("cors", running.cors != reloaded.cors),
        ("signing", running.signing != reloaded.signing),
        (
            "headers.max_request_body_bytes",
            running.headers.max_request_body_bytes != reloaded.headers.max_request_body_bytes,
        ),
        ("trusted_proxy", running.trusted_proxy != reloaded_trust),
        ("firebase", running.firebase != reloaded.firebase),
        ("timeouts", running.timeouts != reloaded.timeouts),
        ("observability", running.observability != reloaded.observability),
        ("admin", running.admin != reloaded.admin),
    ]
    .into_iter()
    .filter_map(|(section, changed)| changed.then_some(section))
    .collect()
}

fn reloadable_changed(applied: &AppConfig, reloaded: &AppConfig) -> bool {
    let (a, b) = (&applied.headers, &reloaded.headers);
    a.real_ip_headers != b.real_ip_headers
        || a.remove_headers != b.remove_headers
        || a.log_request_body != b.log_request_body
        || a.log_response_body != b.log_response_body
        || applied.trusted_proxy.enforce != reloaded.trusted_proxy.enforce
}

/// Decides what a freshly loaded file means for the running process.
#[derive(Debug)]
pub struct ReloadTracker {
    startup: AppConfig,
    applied: AppConfig,
}

impl ReloadTracker {
    pub fn new(startup: AppConfig) -> Self {
        Self {
            applied: startup.clone(),
            startup,
        }
    }

    /// Report restart-only edits and return the config to apply, if any
    /// reloadable setting changed since the last update.
    pub fn accept(&mut self, reloaded: AppConfig) -> Option<AppConfig> {
        let pending = restart_required(&self.startup, &reloaded);
        if !pending.is_empty() {
            tracing::warn!(sections = ?pending, "Config changes need a restart to take effect");
        }

        if !reloadable_changed(&self.applied, &reloaded) {
            tracing::debug!("No reloadable settings changed");
            return None;
        }
        self.applied = reloaded.clone();
        Some(reloaded)
    }
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    tracker: ReloadTracker,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    ///
    /// `running` is the configuration the process was started with.
    pub fn new(path: &Path, running: AppConfig) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                tracker: ReloadTracker::new(running),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut tracker,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&watched) {
                        Ok(reloaded) => {
                            if let Some(update) = tracker.accept(reloaded) {
                                let _ = update_tx.send(update);
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Config reload rejected, keeping current settings")
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_config_needs_nothing() {
        let config = AppConfig::default();
        assert!(restart_required(&config, &config.clone()).is_empty());
    }

    #[test]
    fn restart_only_sections_are_reported() {
        let running = AppConfig::default();
        let mut reloaded = running.clone();
        reloaded.cors.allow_origins = vec!["https://other.example.com".into()];
        reloaded.trusted_proxy.static_proxies = vec!["10.0.0.0/8".into()];
        reloaded.headers.max_request_body_bytes += 1;

        assert_eq!(
            restart_required(&running, &reloaded),
            vec!["cors", "headers.max_request_body_bytes", "trusted_proxy"]
        );
    }

    #[test]
    fn runtime_fields_are_not_reported() {
        let running = AppConfig::default();
        let mut reloaded = running.clone();
        reloaded.trusted_proxy.enforce = !running.trusted_proxy.enforce;
        reloaded.headers.remove_headers = vec!["X-Powered-By".into()];
        reloaded.headers.log_response_body = true;

        assert!(restart_required(&running, &reloaded).is_empty());
    }

    #[test]
    fn restart_only_edit_is_not_forwarded() {
        let running = AppConfig::default();
        let mut tracker = ReloadTracker::new(running.clone());

        let mut reloaded = running;
        reloaded.signing.max_body_bytes += 1;
        assert!(tracker.accept(reloaded).is_none());
    }

    #[test]
    fn reloadable_edit_is_forwarded_once() {
        let running = AppConfig::default();
        let mut tracker = ReloadTracker::new(running.clone());

        let mut reloaded = running;
        reloaded.trusted_proxy.enforce = !reloaded.trusted_proxy.enforce;
        let update = tracker.accept(reloaded.clone()).expect("enforce toggled");
        assert_eq!(update.trusted_proxy.enforce, reloaded.trusted_proxy.enforce);

        // Editor save events often fire twice for one write.
        assert!(tracker.accept(reloaded).is_none());
    }
}
