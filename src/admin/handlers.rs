use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::environment::{EnvironmentEntry, EnvironmentKey};
use crate::http::{ApiError, AppState};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub cache_entries: usize,
    pub trusted_proxies: usize,
    pub enforce_trusted_proxy: bool,
    pub firebase_enabled: bool,
}

#[derive(Serialize)]
pub struct ReloadSummary {
    pub message: &'static str,
    pub entries: usize,
}

#[derive(Serialize)]
pub struct TrustedProxyList {
    pub count: usize,
    pub entries: Vec<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        cache_entries: state.environment.cache().len(),
        trusted_proxies: state.trusted_proxies.current().len(),
        enforce_trusted_proxy: state.settings.load().enforce_trusted_proxy,
        firebase_enabled: state.firebase.is_some(),
    })
}

pub async fn reload_environment(State(state): State<AppState>) -> Result<Json<ReloadSummary>, ApiError> {
    let entries = state.environment.refresh_cache().await?;
    tracing::info!(entries, "Environment cache reloaded via admin API");
    Ok(Json(ReloadSummary {
        message: "Environment cache reloaded successfully",
        entries,
    }))
}

/// Entries straight from the store, sensitive values masked.
pub async fn get_environment(State(state): State<AppState>) -> Result<Json<Vec<EnvironmentEntry>>, ApiError> {
    let entries = state
        .environment
        .get_all()
        .await?
        .into_iter()
        .map(mask_sensitive)
        .collect();
    Ok(Json(entries))
}

/// One entry by symbolic name or key code, read from the store.
pub async fn get_environment_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EnvironmentEntry>, ApiError> {
    match state.environment.find_entry(&key).await? {
        Some(entry) => Ok(Json(mask_sensitive(entry))),
        None => Err(ApiError::NotFound(format!("environment key '{key}' not found"))),
    }
}

fn mask_sensitive(entry: EnvironmentEntry) -> EnvironmentEntry {
    match EnvironmentKey::from_code(&entry.key_code) {
        Some(key) if key.is_sensitive() => entry.masked(),
        _ => entry,
    }
}

pub async fn get_trusted_proxies(State(state): State<AppState>) -> Json<TrustedProxyList> {
    let set = state.trusted_proxies.current();
    Json(TrustedProxyList {
        count: set.len(),
        entries: set.iter().map(ToString::to_string).collect(),
    })
}

pub async fn refresh_trusted_proxies(State(state): State<AppState>) -> Result<Json<TrustedProxyList>, ApiError> {
    state.trusted_proxies.refresh().await?;
    Ok(get_trusted_proxies(State(state)).await)
}
