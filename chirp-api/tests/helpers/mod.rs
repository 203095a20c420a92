//! Shared test helpers
//!
//! - `ScriptedAnalyzer`: engine stand-in that replays a fixed outcome and
//!   records what it was asked to analyze
//! - `TestApp`: router wired to a scripted engine and a private staging dir
//! - multipart request builders and JSON body extraction

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chirp_api::engine::{AnalysisRequest, Analyzer, EngineError, EngineHandle};
use chirp_api::{build_router, AppState};
use chirp_common::api::Detection;
use chirp_common::config::{ConfigOverrides, ServiceConfig, TomlConfig};
use http_body_util::BodyExt;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BOUNDARY: &str = "chirp-test-boundary";

/// What the scripted engine does on every call
#[derive(Debug, Clone)]
pub enum Script {
    Detect(Vec<Detection>),
    /// Detect, after swapping the staged file for a non-empty directory
    /// so it can no longer be unlinked
    DetectThenBlockCleanup(Vec<Detection>),
    /// Detect, after deleting the staged file
    DetectThenRemove(Vec<Detection>),
    FormatError(String),
    Fail(String),
    Panic,
}

/// Snapshot taken while the engine was running
#[derive(Debug, Clone)]
pub struct SeenCall {
    pub request: AnalysisRequest,
    /// Staged file size observed during the call (None if missing)
    pub staged_len: Option<u64>,
}

pub struct ScriptedAnalyzer {
    script: Script,
    calls: Mutex<Vec<SeenCall>>,
}

impl ScriptedAnalyzer {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<SeenCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn analyze(&self, request: &AnalysisRequest) -> Result<Vec<Detection>, EngineError> {
        let staged_len = std::fs::metadata(&request.path).ok().map(|m| m.len());
        self.calls.lock().unwrap().push(SeenCall {
            request: request.clone(),
            staged_len,
        });

        match &self.script {
            Script::Detect(detections) => Ok(detections.clone()),
            Script::DetectThenBlockCleanup(detections) => {
                std::fs::remove_file(&request.path).unwrap();
                std::fs::create_dir(&request.path).unwrap();
                std::fs::write(request.path.join("pinned"), b"x").unwrap();
                Ok(detections.clone())
            }
            Script::DetectThenRemove(detections) => {
                std::fs::remove_file(&request.path).unwrap();
                Ok(detections.clone())
            }
            Script::FormatError(message) => Err(EngineError::Format(message.clone())),
            Script::Fail(message) => Err(EngineError::Analysis(message.clone())),
            Script::Panic => panic!("scripted engine panic"),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub staging: TempDir,
}

impl TestApp {
    /// Files currently sitting in the staging directory
    pub fn staged_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

fn test_config(staging: &Path, max_file_size: Option<u64>) -> ServiceConfig {
    let overrides = ConfigOverrides {
        staging_dir: Some(staging.to_path_buf()),
        max_file_size,
        ..Default::default()
    };
    ServiceConfig::resolve(overrides, TomlConfig::default()).unwrap()
}

/// App whose engine is ready and follows `script`
pub fn ready_app(script: Script) -> TestApp {
    ready_app_with_limit(script, None)
}

pub fn ready_app_with_limit(script: Script, max_file_size: Option<u64>) -> TestApp {
    let staging = tempfile::tempdir().unwrap();
    let analyzer = ScriptedAnalyzer::new(script);
    let engine = EngineHandle::with_analyzer(analyzer.clone());
    let state = AppState::new(engine, &test_config(staging.path(), max_file_size)).unwrap();

    TestApp {
        router: build_router(state),
        analyzer,
        staging,
    }
}

/// App whose engine never finishes initializing
pub fn initializing_app() -> TestApp {
    let staging = tempfile::tempdir().unwrap();
    let state = AppState::new(EngineHandle::new(), &test_config(staging.path(), None)).unwrap();

    TestApp {
        router: build_router(state),
        analyzer: ScriptedAnalyzer::new(Script::Detect(Vec::new())),
        staging,
    }
}

pub fn detection(common_name: &str, confidence: f64, start_time: f64) -> Detection {
    Detection {
        common_name: Some(common_name.to_string()),
        scientific_name: Some(format!("{} scientificus", common_name)),
        confidence: Some(confidence),
        start_time: Some(start_time),
        end_time: Some(start_time + 3.0),
        extra: Map::new(),
    }
}

/// Multipart body with one field
///
/// `filename` None omits the filename attribute entirely.
pub fn multipart_body(field_name: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field_name, name
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", field_name).as_bytes(),
        ),
    }
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST /analyze{query} uploading `content` as the `file` field
pub fn upload_request(query: &str, filename: &str, content: &[u8]) -> Request<Body> {
    raw_upload_request(query, multipart_body("file", Some(filename), content))
}

pub fn raw_upload_request(query: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/analyze{}", query))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Extract JSON body from response
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
