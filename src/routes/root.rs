//! Service-level endpoints.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::environment::EnvironmentKey;
use crate::http::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/reload", get(reload))
}

async fn healthcheck(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let version = state.environment.get_value(EnvironmentKey::Version)?;
    Ok(Json(json!({ "version": version })))
}

async fn reload(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let entries = state.environment.refresh_cache().await?;
    tracing::info!(entries, "Environment cache reloaded via /reload");
    Ok(Json(json!({
        "message": "Environment cache reloaded successfully",
        "entries": entries,
    })))
}
