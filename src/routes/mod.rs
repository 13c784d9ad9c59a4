//! Route registration.
//!
//! Each module contributes a `router()`; new modules are added to [`ROUTES`].

pub mod root;
pub mod users;

use axum::Router;

use crate::http::state::AppState;

pub const ROUTES: &[fn() -> Router<AppState>] = &[root::router, users::router];

pub fn router() -> Router<AppState> {
    ROUTES.iter().fold(Router::new(), |router, routes| router.merge(routes()))
}
