//! Firebase-authenticated user endpoints.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::extract_token;
use crate::http::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/users", post(create_user))
}

async fn create_user(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let verifier = state.firebase.as_ref().ok_or(ApiError::AuthDisabled)?;
    let token = extract_token(headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()))?;
    let user = verifier.verify(token).await?;

    tracing::info!(uid = %user.uid, "Authenticated Firebase user");
    Ok(Json(json!({
        "message": "You are authenticated with Firebase!",
        "userId": user.uid,
        "email": user.email,
    })))
}
