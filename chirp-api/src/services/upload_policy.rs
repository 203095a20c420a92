//! Upload validation rules
//!
//! Checks run in a fixed order: filename present, extension allowed,
//! content non-empty, content within the size limit. Nothing is written to
//! disk until all of them pass.

use chirp_common::config::UploadConfig;
use std::path::{Path, PathBuf};

use crate::error::AnalyzeError;

/// Headroom above the file limit for multipart framing and other fields
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Validation and staging rules for uploads
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
    max_file_size: u64,
    max_file_size_mb: f64,
    staging_dir: PathBuf,
}

impl UploadPolicy {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            allowed_extensions: config.allowed_extensions.clone(),
            max_file_size: config.max_file_size,
            max_file_size_mb: config.max_file_size_mb(),
            staging_dir: config.staging_dir.clone(),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Request body limit enforced by the transport layer
    pub fn transport_body_limit(&self) -> usize {
        usize::try_from(self.max_file_size.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
    }

    /// Filename must be present and non-blank
    pub fn require_filename(filename: Option<&str>) -> Result<&str, AnalyzeError> {
        match filename {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(AnalyzeError::BadInput("No file provided".to_string())),
        }
    }

    /// Return the lowercase extension (".wav") if it is allowed
    pub fn validate_extension(&self, filename: &str) -> Result<String, AnalyzeError> {
        let extension = file_extension(filename);

        if self.allowed_extensions.contains(&extension) {
            Ok(extension)
        } else {
            Err(AnalyzeError::BadInput(format!(
                "Unsupported file format: {}. Allowed formats: {}",
                if extension.is_empty() { "(none)" } else { extension.as_str() },
                self.allowed_extensions.join(", ")
            )))
        }
    }

    /// Reject empty or oversize content
    pub fn validate_content(&self, content: &[u8]) -> Result<(), AnalyzeError> {
        if content.is_empty() {
            return Err(AnalyzeError::BadInput("Uploaded file is empty".to_string()));
        }
        self.check_size(content.len() as u64)
    }

    /// Reject sizes above the configured maximum
    pub fn check_size(&self, size: u64) -> Result<(), AnalyzeError> {
        if size > self.max_file_size {
            Err(self.oversize_error())
        } else {
            Ok(())
        }
    }

    pub fn oversize_error(&self) -> AnalyzeError {
        AnalyzeError::BadInput(format!(
            "File too large. Maximum size: {:.1}MB",
            self.max_file_size_mb
        ))
    }
}

/// Lowercase extension with leading dot, or "" when there is none
///
/// Client filenames may carry Windows-style directories, so only the part
/// after the last separator is considered.
pub fn file_extension(filename: &str) -> String {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(filename);
    Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}
