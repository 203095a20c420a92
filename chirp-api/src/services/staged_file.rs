//! Transient on-disk copy of an upload
//!
//! A `StagedFile` owns its path from the moment the file is created. Dropping
//! it deletes the file, so every exit from the request (success, error
//! return, or panic unwinding) releases it. Deletion failures are logged and
//! never surfaced.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Staged upload, removed on drop
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Write `contents` to a fresh uniquely named file in `dir`
    ///
    /// The name ends with `extension` (".wav") so the engine can pick a
    /// decoder. Data is flushed and synced to disk before returning.
    pub async fn write(dir: &Path, extension: &str, contents: &[u8]) -> io::Result<Self> {
        let path = dir.join(format!("chirp_{}{}", Uuid::new_v4().simple(), extension));

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        let staged = Self { path };

        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await?;

        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file as seen on disk right now
    pub async fn len_on_disk(&self) -> io::Result<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // Single unlink; Drop cannot await and must also run while unwinding
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Cleaned up temporary file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to cleanup temp file: {}", e),
        }
    }
}
