//! API routes.

pub mod config;
pub mod health;

use axum::Router;
use axum::routing::post;

use crate::AppState;

/// Build the main API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(config::resolve_config))
        .merge(health::router())
        .with_state(state)
}
