//! Audio analysis endpoint
//!
//! POST /analyze?lat=&lon=&min_conf= with a multipart `file` field.
//!
//! Per request: query validation → readiness gate → filename and extension
//! checks → body read (empty/oversize checks) → staging → engine call →
//! response. The staged file is a drop guard, so it is removed on every
//! path out of the handler.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chirp_common::api::AnalysisResponse;
use serde::Deserialize;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::{
    engine::{AnalysisRequest, EngineError},
    error::{AnalyzeError, ApiResult},
    services::{StagedFile, UploadPolicy},
    AppState,
};

/// Query parameters for POST /analyze
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    /// Latitude for location-based filtering
    pub lat: Option<f64>,
    /// Longitude for location-based filtering
    pub lon: Option<f64>,
    /// Minimum confidence threshold (0.0-1.0)
    pub min_conf: Option<f64>,
}

/// Validated analysis parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub min_confidence: f64,
}

impl AnalyzeParams {
    /// Range-check the parameters, filling in the default threshold
    pub fn validate(self, default_min_confidence: f64) -> ApiResult<AnalysisOptions> {
        let min_confidence = self.min_conf.unwrap_or(default_min_confidence);
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(AnalyzeError::InvalidParameter(format!(
                "min_conf must be between 0.0 and 1.0, got {}",
                min_confidence
            )));
        }

        if let Some(lat) = self.lat {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AnalyzeError::InvalidParameter(format!(
                    "lat must be between -90 and 90, got {}",
                    lat
                )));
            }
        }

        if let Some(lon) = self.lon {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(AnalyzeError::InvalidParameter(format!(
                    "lon must be between -180 and 180, got {}",
                    lon
                )));
            }
        }

        Ok(AnalysisOptions {
            latitude: self.lat,
            longitude: self.lon,
            min_confidence,
        })
    }
}

/// Upload that passed every validation step
#[derive(Debug)]
struct Upload {
    filename: String,
    extension: String,
    content: Vec<u8>,
}

/// POST /analyze
///
/// Analyze an audio file (mp3, wav, flac, m4a, ogg, wma, aac) for bird
/// sounds and return detected species with confidence and time ranges.
pub async fn analyze_audio(
    State(state): State<AppState>,
    params: Result<Query<AnalyzeParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AnalysisResponse>> {
    let Query(params) = params.map_err(|e| AnalyzeError::InvalidParameter(e.body_text()))?;
    let options = params.validate(state.default_min_confidence)?;

    if !state.engine.is_ready() {
        warn!("Rejecting analysis request: analyzer still initializing");
        return Err(AnalyzeError::NotReady);
    }

    let mut multipart = multipart.map_err(|e| AnalyzeError::BadInput(e.body_text()))?;
    let upload = read_upload(&mut multipart, &state.upload_policy).await?;

    let staged = stage_upload(&state.upload_policy, &upload).await?;
    info!(
        "Processing file: {} ({} bytes)",
        upload.filename,
        upload.content.len()
    );

    let request = AnalysisRequest {
        path: staged.path().to_path_buf(),
        latitude: options.latitude,
        longitude: options.longitude,
        min_confidence: options.min_confidence,
    };

    let started = Instant::now();
    let outcome = state.engine.analyze(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    let detections = outcome.map_err(|e| map_engine_error(e, &upload, &staged, &options))?;
    info!(
        filename = %upload.filename,
        "Analysis complete: {} detections in {:.2}s",
        detections.len(),
        elapsed
    );

    Ok(Json(AnalysisResponse::new(upload.filename, detections, elapsed)))
}

/// Find the `file` field, validate its name, and read it in full
async fn read_upload(multipart: &mut Multipart, policy: &UploadPolicy) -> ApiResult<Upload> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, policy))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = UploadPolicy::require_filename(field.file_name())?.to_string();
        let extension = policy.validate_extension(&filename)?;

        let mut content = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, policy))? {
            // Stop reading as soon as the limit is crossed
            policy.check_size((content.len() + chunk.len()) as u64)?;
            content.extend_from_slice(&chunk);
        }
        policy.validate_content(&content)?;

        return Ok(Upload {
            filename,
            extension,
            content,
        });
    }

    Err(AnalyzeError::BadInput("No file provided".to_string()))
}

fn multipart_error(err: MultipartError, policy: &UploadPolicy) -> AnalyzeError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        policy.oversize_error()
    } else {
        AnalyzeError::BadInput(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Write the upload to transient storage and confirm it landed
async fn stage_upload(policy: &UploadPolicy, upload: &Upload) -> ApiResult<StagedFile> {
    let staged = StagedFile::write(policy.staging_dir(), &upload.extension, &upload.content)
        .await
        .map_err(|e| {
            error!(
                filename = %upload.filename,
                staging_dir = %policy.staging_dir().display(),
                "Failed to stage upload: {}",
                e
            );
            AnalyzeError::StagingFailure("Failed to save uploaded file".to_string())
        })?;

    match staged.len_on_disk().await {
        Ok(len) if len > 0 => Ok(staged),
        Ok(_) => {
            error!(path = %staged.path().display(), "Staged file is empty");
            Err(AnalyzeError::StagingFailure("Failed to save uploaded file".to_string()))
        }
        Err(e) => {
            error!(path = %staged.path().display(), "Staged file missing: {}", e);
            Err(AnalyzeError::StagingFailure("Failed to save uploaded file".to_string()))
        }
    }
}

fn map_engine_error(
    err: EngineError,
    upload: &Upload,
    staged: &StagedFile,
    options: &AnalysisOptions,
) -> AnalyzeError {
    match err {
        EngineError::Format(message) => {
            error!(filename = %upload.filename, "Audio format error: {}", message);
            AnalyzeError::BadInput(format!(
                "Unable to read audio file. Please ensure the file is a valid audio format. Error: {}",
                message
            ))
        }
        EngineError::NotReady => AnalyzeError::NotReady,
        EngineError::Aborted(message) => {
            error!(
                filename = %upload.filename,
                path = %staged.path().display(),
                "Analysis task aborted: {}",
                message
            );
            AnalyzeError::Unexpected(anyhow::anyhow!("analysis task aborted: {}", message))
        }
        other => {
            error!(
                filename = %upload.filename,
                path = %staged.path().display(),
                bytes = upload.content.len(),
                lat = ?options.latitude,
                lon = ?options.longitude,
                min_conf = options.min_confidence,
                error = ?other,
                "Analysis error: {}",
                other
            );
            AnalyzeError::EngineFailure(format!("Error during analysis: {}", other))
        }
    }
}

/// Build analysis routes
///
/// `body_limit` sits slightly above the file limit so oversize uploads are
/// normally caught by the streaming size check with the friendlier message.
pub fn analyze_routes(body_limit: usize) -> Router<AppState> {
    Router::new().route(
        "/analyze",
        post(analyze_audio).layer(DefaultBodyLimit::max(body_limit)),
    )
}
