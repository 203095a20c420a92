//! Status endpoints
//!
//! Both handlers read shared state only. They never wait on the engine,
//! so they answer while models are still downloading or while analyses
//! are in flight.

use axum::{extract::State, routing::get, Json, Router};
use chirp_common::api::{HealthResponse, RootResponse};
use chirp_common::config::API_TITLE;

use crate::AppState;

/// GET /
///
/// Liveness message.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: API_TITLE.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health
///
/// Reports "initializing" until the engine has been published.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_readiness(state.engine.is_ready()))
}

/// Build status routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
