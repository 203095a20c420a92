//! HTTP API handlers for chirp-api
//!
//! - `GET /` and `GET /health`: status, answered from the readiness flag only
//! - `POST /analyze`: upload → validate → stage → analyze → respond

pub mod analyze;
pub mod health;

pub use analyze::analyze_routes;
pub use health::health_routes;
