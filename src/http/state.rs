//! Shared application state.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::HeaderName;

use crate::auth::FirebaseVerifier;
use crate::config::AppConfig;
use crate::environment::EnvironmentService;
use crate::security::TrustedProxyResolver;

/// Settings that can change while the server runs (config file reload).
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub real_ip_headers: Vec<HeaderName>,
    pub remove_headers: Vec<HeaderName>,
    pub enforce_trusted_proxy: bool,
    pub log_request_body: bool,
    pub log_response_body: bool,
}

impl RuntimeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            real_ip_headers: header_names(&config.headers.real_ip_headers),
            remove_headers: header_names(&config.headers.remove_headers),
            enforce_trusted_proxy: config.trusted_proxy.enforce,
            log_request_body: config.headers.log_request_body,
            log_response_body: config.headers.log_response_body,
        }
    }
}

fn header_names(names: &[String]) -> Vec<HeaderName> {
    names
        .iter()
        .filter_map(|name| match HeaderName::from_bytes(name.as_bytes()) {
            Ok(header) => Some(header),
            Err(_) => {
                tracing::warn!(header = %name, "Ignoring invalid header name");
                None
            }
        })
        .collect()
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub settings: Arc<ArcSwap<RuntimeSettings>>,
    pub environment: Arc<EnvironmentService>,
    pub trusted_proxies: Arc<TrustedProxyResolver>,
    pub firebase: Option<Arc<FirebaseVerifier>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        environment: Arc<EnvironmentService>,
        trusted_proxies: Arc<TrustedProxyResolver>,
        firebase: Option<Arc<FirebaseVerifier>>,
    ) -> Self {
        let settings = RuntimeSettings::from_config(&config);
        Self {
            config: Arc::new(config),
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            environment,
            trusted_proxies,
            firebase,
        }
    }

    /// Swap in the runtime settings of a new configuration. Every other
    /// section keeps its startup value.
    pub fn apply_config(&self, config: &AppConfig) {
        self.settings.store(Arc::new(RuntimeSettings::from_config(config)));
        tracing::info!(
            enforce_trusted_proxy = config.trusted_proxy.enforce,
            removed_headers = config.headers.remove_headers.len(),
            real_ip_headers = config.headers.real_ip_headers.len(),
            "Runtime settings updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_header_names_are_skipped() {
        let mut config = AppConfig::default();
        config.headers.remove_headers = vec!["Server".into(), "bad header".into()];
        let settings = RuntimeSettings::from_config(&config);
        assert_eq!(settings.remove_headers, vec![HeaderName::from_static("server")]);
        assert_eq!(settings.real_ip_headers.len(), 3);
    }
}
