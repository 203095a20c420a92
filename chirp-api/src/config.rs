//! Command-line and environment configuration for chirp-api
//!
//! Every flag can also be supplied through the environment variable named
//! in its `env` attribute. Values left unset fall through to the optional
//! TOML file and then to compiled defaults (see `chirp_common::config`).

use chirp_common::config::{
    load_toml_config, ConfigOverrides, ServiceConfig, TomlConfig, API_DESCRIPTION,
};
use clap::builder::BoolishValueParser;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for chirp-api
#[derive(Parser, Debug, Default)]
#[command(name = "chirp-api")]
#[command(about = API_DESCRIPTION)]
#[command(version)]
pub struct Args {
    /// Optional TOML bootstrap file
    #[arg(long, env = "CHIRP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Debug mode (forces debug logging)
    #[arg(long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: Option<bool>,

    /// Comma-separated browser origins allowed by CORS
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Maximum upload size in bytes
    #[arg(long, env = "MAX_FILE_SIZE")]
    pub max_file_size: Option<u64>,

    /// Comma-separated accepted file extensions
    #[arg(long, env = "ALLOWED_EXTENSIONS", value_delimiter = ',')]
    pub allowed_extensions: Option<Vec<String>>,

    /// Confidence threshold when a request omits `min_conf`
    #[arg(long, env = "DEFAULT_MIN_CONFIDENCE")]
    pub default_min_confidence: Option<f64>,

    /// Where the engine caches downloaded models
    #[arg(long, env = "MODEL_CACHE_DIR")]
    pub model_cache_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// BirdNET command-line tool
    #[arg(long, env = "BIRDNET_COMMAND")]
    pub engine_command: Option<String>,

    /// Directory for staged uploads
    #[arg(long, env = "STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            debug: self.debug,
            cors_origins: self.cors_origins.clone(),
            max_file_size: self.max_file_size,
            allowed_extensions: self.allowed_extensions.clone(),
            default_min_confidence: self.default_min_confidence,
            model_cache_dir: self.model_cache_dir.clone(),
            log_level: self.log_level.clone(),
            engine_command: self.engine_command.clone(),
            staging_dir: self.staging_dir.clone(),
        }
    }

    /// Resolve the final configuration: CLI/ENV → TOML → defaults
    pub fn resolve(&self) -> chirp_common::Result<ServiceConfig> {
        let toml = match &self.config {
            Some(path) => load_toml_config(path)?,
            None => TomlConfig::default(),
        };
        ServiceConfig::resolve(self.overrides(), toml)
    }
}
