//! chirp-api library interface
//!
//! Exposes the router, application state and engine seams so integration
//! tests can drive the service without binding a socket.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;

pub use crate::error::{AnalyzeError, ApiResult};

use axum::http::HeaderValue;
use axum::Router;
use chirp_common::config::ServiceConfig;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::EngineHandle;
use crate::services::UploadPolicy;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared analysis engine, published once initialization completes
    pub engine: EngineHandle,
    /// Upload validation and staging rules
    pub upload_policy: Arc<UploadPolicy>,
    /// Threshold used when a request omits `min_conf`
    pub default_min_confidence: f64,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Arc<Vec<HeaderValue>>,
}

impl AppState {
    pub fn new(engine: EngineHandle, config: &ServiceConfig) -> chirp_common::Result<Self> {
        let cors_origins = config
            .server
            .cors_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| {
                    chirp_common::Error::Config(format!("Invalid CORS origin '{}': {}", origin, e))
                })
            })
            .collect::<chirp_common::Result<Vec<_>>>()?;

        Ok(Self {
            engine,
            upload_policy: Arc::new(UploadPolicy::from_config(&config.upload)),
            default_min_confidence: config.analysis.default_min_confidence,
            cors_origins: Arc::new(cors_origins),
        })
    }
}

/// Build application router
///
/// Status routes never touch the engine beyond its readiness flag, so they
/// keep answering while the engine initializes or is busy analyzing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(state.cors_origins.iter().cloned()))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let body_limit = state.upload_policy.transport_body_limit();

    Router::new()
        .merge(api::health_routes())
        .merge(api::analyze_routes(body_limit))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
