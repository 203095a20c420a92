//! Configuration loading and resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument / environment variable (highest priority)
//! 2. TOML bootstrap file
//! 3. OS-dependent compiled default (fallback)
//!
//! Missing TOML files are not an error: the service logs a warning and
//! starts on compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Human-readable API title reported by the service
pub const API_TITLE: &str = "Bird Sound Analyzer API";

/// One-line API description
pub const API_DESCRIPTION: &str = "REST API for analyzing bird sounds using BirdNET";

/// Built-in defaults used when neither CLI/ENV nor TOML supplies a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub cors_origins: Vec<String>,
    /// Maximum accepted upload size in bytes (100 MB)
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub default_min_confidence: f64,
    pub model_cache_dir: PathBuf,
    pub log_level: String,
    pub engine_command: String,
    pub staging_dir: PathBuf,
}

impl CompiledDefaults {
    /// Defaults for the platform the binary was compiled for
    pub fn for_current_platform() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            max_file_size: 104_857_600,
            allowed_extensions: [".mp3", ".wav", ".flac", ".m4a", ".ogg", ".wma", ".aac"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            default_min_confidence: 0.25,
            model_cache_dir: default_model_cache_dir(),
            log_level: "info".to_string(),
            engine_command: "birdnet-cli".to_string(),
            staging_dir: std::env::temp_dir(),
        }
    }
}

/// Get OS-dependent default model cache directory
fn default_model_cache_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/birdnetlib
        dirs::data_local_dir()
            .map(|d| d.join("birdnetlib"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/birdnetlib"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("birdnetlib"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/birdnetlib"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("birdnetlib"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\birdnetlib"))
    } else {
        PathBuf::from("./birdnetlib")
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// All fields are optional. Anything left out falls through to the
/// compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: Option<bool>,
    pub cors_origins: Option<Vec<String>>,
    pub max_file_size: Option<u64>,
    pub allowed_extensions: Option<Vec<String>>,
    pub default_min_confidence: Option<f64>,
    pub model_cache_dir: Option<PathBuf>,
    pub engine_command: Option<String>,
    pub staging_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: Option<bool>,
    pub cors_origins: Option<Vec<String>>,
    pub max_file_size: Option<u64>,
    pub allowed_extensions: Option<Vec<String>>,
    pub default_min_confidence: Option<f64>,
    pub model_cache_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub engine_command: Option<String>,
    pub staging_dir: Option<PathBuf>,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub cors_origins: Vec<String>,
}

/// Upload validation and staging settings
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum upload size in bytes
    pub max_file_size: u64,
    /// Lowercase extensions including the leading dot (".wav")
    pub allowed_extensions: Vec<String>,
    /// Directory that receives staged uploads
    pub staging_dir: PathBuf,
}

impl UploadConfig {
    /// Maximum upload size expressed in megabytes (1 MB = 1024 * 1024 bytes)
    pub fn max_file_size_mb(&self) -> f64 {
        self.max_file_size as f64 / 1024.0 / 1024.0
    }
}

/// Analysis engine settings
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Confidence threshold applied when the request does not supply one
    pub default_min_confidence: f64,
    /// Where the engine keeps downloaded model artifacts
    pub model_cache_dir: PathBuf,
    /// Engine executable (name on PATH or absolute path)
    pub engine_command: String,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub analysis: AnalysisConfig,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides, TOML values and compiled defaults, then validate
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();

        let config = Self {
            server: ServerConfig {
                host: pick(overrides.host, toml.host, defaults.host),
                port: pick(overrides.port, toml.port, defaults.port),
                debug: pick(overrides.debug, toml.debug, defaults.debug),
                cors_origins: pick(overrides.cors_origins, toml.cors_origins, defaults.cors_origins),
            },
            upload: UploadConfig {
                max_file_size: pick(overrides.max_file_size, toml.max_file_size, defaults.max_file_size),
                allowed_extensions: normalize_extensions(&pick(
                    overrides.allowed_extensions,
                    toml.allowed_extensions,
                    defaults.allowed_extensions,
                )),
                staging_dir: pick(overrides.staging_dir, toml.staging_dir, defaults.staging_dir),
            },
            analysis: AnalysisConfig {
                default_min_confidence: pick(
                    overrides.default_min_confidence,
                    toml.default_min_confidence,
                    defaults.default_min_confidence,
                ),
                model_cache_dir: pick(overrides.model_cache_dir, toml.model_cache_dir, defaults.model_cache_dir),
                engine_command: pick(overrides.engine_command, toml.engine_command, defaults.engine_command),
            },
            log_level: pick(overrides.log_level, toml.logging.level, defaults.log_level).to_lowercase(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let min_conf = self.analysis.default_min_confidence;
        if !(0.0..=1.0).contains(&min_conf) {
            return Err(Error::Config(format!(
                "default_min_confidence must be within 0.0-1.0, got {}",
                min_conf
            )));
        }

        if self.upload.max_file_size == 0 {
            return Err(Error::Config("max_file_size must be greater than zero".to_string()));
        }

        if self.upload.allowed_extensions.is_empty() {
            return Err(Error::Config("allowed_extensions must not be empty".to_string()));
        }

        if self.analysis.engine_command.trim().is_empty() {
            return Err(Error::Config("engine_command must not be empty".to_string()));
        }

        Ok(())
    }

    /// Default log filter directive
    ///
    /// Debug mode always logs at debug level regardless of `log_level`.
    pub fn log_filter(&self) -> &str {
        if self.server.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

fn pick<T>(override_value: Option<T>, toml_value: Option<T>, default: T) -> T {
    override_value.or(toml_value).unwrap_or(default)
}

/// Lowercase, add the leading dot and drop blanks/duplicates
pub fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let trimmed = ext.trim().trim_start_matches('.').to_lowercase();
        if trimmed.is_empty() {
            continue;
        }
        let dotted = format!(".{}", trimmed);
        if !normalized.contains(&dotted) {
            normalized.push(dotted);
        }
    }
    normalized
}

/// Load the TOML bootstrap file
///
/// A missing file yields the empty configuration (with a warning). A file
/// that exists but cannot be parsed is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}
