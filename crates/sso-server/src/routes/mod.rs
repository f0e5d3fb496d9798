pub mod auth;
pub mod health;

use axum::Router;

use crate::api::AuthApi;
use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes<E: AuthApi>() -> Router<AppState<E>> {
    Router::new().nest("/auth", auth::router())
}
