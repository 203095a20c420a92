//! API module for shared HTTP wire types
//!
//! Contains ONLY serde types. The axum handlers that produce them live in
//! `chirp-api`.

pub mod types;

pub use types::{AnalysisResponse, Detection, ErrorResponse, HealthResponse, RootResponse};
