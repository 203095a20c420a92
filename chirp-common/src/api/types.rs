//! Shared API request/response types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ========================================
// Analysis Types
// ========================================

/// One species identification reported by the analysis engine
///
/// The service never interprets these fields; records are returned in the
/// order and shape the engine produced them. Every well-known field is
/// optional, so a record missing one (or carrying `null`) still passes
/// through. Fields the engine adds beyond the well-known ones are kept in
/// `extra` and serialized back inline.
///
/// # Examples
///
/// ```
/// use chirp_common::api::types::Detection;
///
/// let json = r#"{"common_name":"House Sparrow","scientific_name":"Passer domesticus",
///               "confidence":0.91,"start_time":3.0,"end_time":6.0,"label":"x"}"#;
/// let detection: Detection = serde_json::from_str(json).unwrap();
/// assert_eq!(detection.common_name.as_deref(), Some("House Sparrow"));
/// assert_eq!(detection.extra["label"], "x");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    /// Engine confidence (0.0-1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Offset of the detection window start, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    /// Offset of the detection window end, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Successful POST /analyze response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisResponse {
    /// Original client-side filename
    pub filename: String,
    pub detections: Vec<Detection>,
    /// Always equal to `detections.len()`
    pub detection_count: usize,
    /// Wall-clock engine time, rounded to two decimals
    pub analysis_time_seconds: f64,
}

impl AnalysisResponse {
    /// Assemble a response, deriving the count and rounding the duration
    pub fn new(filename: String, detections: Vec<Detection>, elapsed_seconds: f64) -> Self {
        Self {
            filename,
            detection_count: detections.len(),
            detections,
            analysis_time_seconds: round_to_hundredths(elapsed_seconds),
        }
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ========================================
// Status Types
// ========================================

/// GET / response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// GET /health response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "initializing"
    pub status: String,
    pub analyzer_ready: bool,
    pub message: String,
}

impl HealthResponse {
    pub fn from_readiness(ready: bool) -> Self {
        if ready {
            Self {
                status: "healthy".to_string(),
                analyzer_ready: true,
                message: "Analyzer ready".to_string(),
            }
        } else {
            Self {
                status: "initializing".to_string(),
                analyzer_ready: false,
                message: "Analyzer initializing (downloading models on first run)".to_string(),
            }
        }
    }
}

// ========================================
// Error Response Types
// ========================================

/// Body of every non-2xx response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Human-readable explanation
    pub detail: String,
    /// Stable machine-readable code (e.g. "BAD_REQUEST")
    pub code: String,
}
