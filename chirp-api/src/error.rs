//! Error types for chirp-api
//!
//! Every failure of the analysis pipeline is one of these kinds. The
//! mapping to an HTTP status happens once, in `IntoResponse`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chirp_common::api::ErrorResponse;
use std::any::Any;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Engine has not finished initializing (503)
    #[error("Analyzer not ready. Please wait for initialization to complete.")]
    NotReady,

    /// Client sent something we cannot analyze (400)
    #[error("{0}")]
    BadInput(String),

    /// Query parameter failed validation (422)
    #[error("{0}")]
    InvalidParameter(String),

    /// Upload could not be written to transient storage (500)
    #[error("{0}")]
    StagingFailure(String),

    /// Engine failed for a reason other than undecodable audio (500)
    #[error("{0}")]
    EngineFailure(String),

    /// Anything not anticipated above (500)
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AnalyzeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyzeError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            AnalyzeError::BadInput(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::InvalidParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyzeError::StagingFailure(_)
            | AnalyzeError::EngineFailure(_)
            | AnalyzeError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            AnalyzeError::NotReady => "NOT_READY",
            AnalyzeError::BadInput(_) => "BAD_REQUEST",
            AnalyzeError::InvalidParameter(_) => "INVALID_PARAMETER",
            AnalyzeError::StagingFailure(_) => "STAGING_FAILURE",
            AnalyzeError::EngineFailure(_) => "ENGINE_FAILURE",
            AnalyzeError::Unexpected(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            detail: self.to_string(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, AnalyzeError>;

/// Convert a handler panic into the same 500 body as any unexpected error
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %message, "Handler panicked");
    AnalyzeError::Unexpected(anyhow::anyhow!("internal server fault")).into_response()
}
