//! BirdNET command-line client
//!
//! Drives an external BirdNET tool. The tool contract:
//! - `<cmd> --version` succeeds when the tool is installed
//! - `<cmd> prepare --model-dir <dir>` downloads/loads model artifacts
//! - `<cmd> analyze <file> --model-dir <dir> --min-conf <f> --date <YYYY-MM-DD>
//!   [--lat <f>] [--lon <f>]` prints a JSON array of detections on stdout
//! - exit code 65 (EX_DATAERR) means the input is not decodable audio
//!
//! Each analysis is an independent process, so concurrent calls share no
//! mutable state.

use chirp_common::api::Detection;
use chirp_common::config::AnalysisConfig;
use chrono::{Local, NaiveDate};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

use super::{probe, AnalysisRequest, Analyzer, EngineError};

/// sysexits.h EX_DATAERR: input data was incorrect
pub const EXIT_DATA_ERROR: i32 = 65;

/// BirdNET client
#[derive(Debug, Clone)]
pub struct BirdnetCli {
    command: String,
    model_dir: PathBuf,
}

impl BirdnetCli {
    /// Construct the engine
    ///
    /// Blocking, and slow on first run while models download. Call from the
    /// blocking pool.
    pub fn initialize(config: &AnalysisConfig) -> Result<Self, EngineError> {
        std::fs::create_dir_all(&config.model_cache_dir).map_err(|e| {
            EngineError::Unavailable(format!(
                "Cannot create model cache {}: {}",
                config.model_cache_dir.display(),
                e
            ))
        })?;

        let version = run(Command::new(&config.engine_command).arg("--version"), &config.engine_command)?;
        if !version.status.success() {
            return Err(EngineError::Unavailable(format!(
                "{} --version failed: {}",
                config.engine_command,
                stderr_text(&version)
            )));
        }
        info!(
            command = %config.engine_command,
            version = %String::from_utf8_lossy(&version.stdout).trim(),
            "BirdNET command found"
        );

        info!(model_dir = %config.model_cache_dir.display(), "Preparing BirdNET models");
        let prepare = run(
            Command::new(&config.engine_command)
                .arg("prepare")
                .arg("--model-dir")
                .arg(&config.model_cache_dir),
            &config.engine_command,
        )?;
        if !prepare.status.success() {
            return Err(EngineError::Unavailable(format!(
                "Model preparation failed: {}",
                stderr_text(&prepare)
            )));
        }

        Ok(Self {
            command: config.engine_command.clone(),
            model_dir: config.model_cache_dir.clone(),
        })
    }

    /// Arguments for one `analyze` invocation
    pub fn analyze_args(&self, request: &AnalysisRequest, date: NaiveDate) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "analyze".into(),
            request.path.clone().into_os_string(),
            "--model-dir".into(),
            self.model_dir.clone().into_os_string(),
            "--min-conf".into(),
            request.min_confidence.to_string().into(),
            "--date".into(),
            date.format("%Y-%m-%d").to_string().into(),
        ];

        if let Some(lat) = request.latitude {
            args.push("--lat".into());
            args.push(lat.to_string().into());
        }
        if let Some(lon) = request.longitude {
            args.push("--lon".into());
            args.push(lon.to_string().into());
        }

        args
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }
}

impl Analyzer for BirdnetCli {
    fn analyze(&self, request: &AnalysisRequest) -> Result<Vec<Detection>, EngineError> {
        probe::ensure_decodable(&request.path)?;

        let args = self.analyze_args(request, Local::now().date_naive());
        debug!(command = %self.command, ?args, "Running BirdNET analysis");

        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|e| EngineError::Analysis(format!("Failed to execute {}: {}", self.command, e)))?;

        match output.status.code() {
            Some(0) => parse_detections(&output.stdout),
            Some(EXIT_DATA_ERROR) => Err(EngineError::Format(stderr_text(&output))),
            code => Err(EngineError::Analysis(format!(
                "BirdNET exited with {}: {}",
                code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()),
                stderr_text(&output)
            ))),
        }
    }
}

/// Parse the engine's stdout into detection records
pub fn parse_detections(stdout: &[u8]) -> Result<Vec<Detection>, EngineError> {
    serde_json::from_slice(stdout)
        .map_err(|e| EngineError::Analysis(format!("Failed to parse BirdNET output: {}", e)))
}

fn run(command: &mut Command, name: &str) -> Result<Output, EngineError> {
    command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EngineError::Unavailable(format!("BirdNET command not found: {}", name))
        } else {
            EngineError::Unavailable(format!("Failed to execute {}: {}", name, e))
        }
    })
}

fn stderr_text(output: &Output) -> String {
    let text = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if text.is_empty() {
        "no error output".to_string()
    } else {
        text
    }
}
