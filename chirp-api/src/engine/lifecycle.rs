//! Engine lifecycle
//!
//! One engine per process. It is constructed by a detached background task
//! at startup and published into a `OnceLock`; the lock's state is the
//! readiness flag. Once published the engine is never replaced or dropped
//! before process exit.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{AnalysisRequest, Analyzer, EngineError};
use chirp_common::api::Detection;

/// Shared handle to the process-wide analysis engine
#[derive(Clone, Default)]
pub struct EngineHandle {
    slot: Arc<OnceLock<Arc<dyn Analyzer>>>,
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl EngineHandle {
    /// Handle with no engine yet (not ready)
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that is ready immediately
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>) -> Self {
        let handle = Self::new();
        handle.publish(analyzer);
        handle
    }

    /// Whether the engine has finished initializing
    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Make `analyzer` the process engine
    ///
    /// Only the first call has any effect.
    pub fn publish(&self, analyzer: Arc<dyn Analyzer>) {
        if self.slot.set(analyzer).is_err() {
            warn!("Analyzer already published; ignoring second instance");
        }
    }

    /// Construct the engine in the background and publish it when done
    ///
    /// `factory` runs on the blocking pool because engine construction may
    /// download model artifacts and take minutes. The returned task resolves
    /// to the construction error if the engine could not be built.
    pub fn spawn_initialization<F>(&self, factory: F) -> JoinHandle<Result<(), EngineError>>
    where
        F: FnOnce() -> Result<Arc<dyn Analyzer>, EngineError> + Send + 'static,
    {
        let handle = self.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            info!("Initializing BirdNET analyzer...");
            info!("This may take 1-2 minutes on first run (downloading models)");

            let analyzer = tokio::task::spawn_blocking(factory)
                .await
                .map_err(|e| EngineError::Aborted(e.to_string()))??;

            handle.publish(analyzer);
            info!(
                "✓ BirdNET analyzer ready (took {:.1}s)",
                started.elapsed().as_secs_f64()
            );
            Ok::<(), EngineError>(())
        })
    }

    /// Run one analysis on the blocking pool
    ///
    /// The calling request waits for the result; other requests and status
    /// queries keep being served meanwhile.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<Vec<Detection>, EngineError> {
        let analyzer = self.slot.get().cloned().ok_or(EngineError::NotReady)?;

        tokio::task::spawn_blocking(move || analyzer.analyze(&request))
            .await
            .map_err(|e| EngineError::Aborted(e.to_string()))?
    }
}
