//! Analysis engine seam
//!
//! The acoustic model itself is external. This module defines the narrow
//! contract the service depends on (`Analyzer`), the process-wide handle
//! that owns the single engine instance (`EngineHandle`), and the concrete
//! client for the BirdNET command-line tool (`BirdnetCli`).

pub mod birdnet;
pub mod lifecycle;
pub mod probe;

pub use birdnet::BirdnetCli;
pub use lifecycle::EngineHandle;

use chirp_common::api::Detection;
use std::path::PathBuf;
use thiserror::Error;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine could not be constructed (missing binary, model download failed)
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),

    /// Engine has not been published yet
    #[error("Analyzer not initialized")]
    NotReady,

    /// File could not be decoded as audio
    #[error("{0}")]
    Format(String),

    /// Any other engine failure; carries the engine's own error text
    #[error("{0}")]
    Analysis(String),

    /// Engine call died without returning (panic in the worker thread)
    #[error("Analysis task aborted: {0}")]
    Aborted(String),
}

/// Parameters for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Staged audio file; the extension selects the decoder
    pub path: PathBuf,
    /// Latitude for location-based species filtering
    pub latitude: Option<f64>,
    /// Longitude for location-based species filtering
    pub longitude: Option<f64>,
    /// Minimum confidence threshold (0.0-1.0)
    pub min_confidence: f64,
}

/// Acoustic classification capability
///
/// Calls are blocking and may run for seconds. Implementations must be safe
/// to call from several threads at once: the service does not serialize
/// access to the shared instance.
pub trait Analyzer: Send + Sync {
    /// Detect species in the file at `request.path`, in engine order
    fn analyze(&self, request: &AnalysisRequest) -> Result<Vec<Detection>, EngineError>;
}
