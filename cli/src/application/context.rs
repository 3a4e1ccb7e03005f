//! Per-run context shared by every pipeline stage.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::domain::error::DeploymentFatalError;
use crate::domain::terraform::generate_suffix;

/// State owned by one pipeline run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Resource-name suffix, drawn once so every generated name agrees.
    pub suffix: String,
    pub cancel: CancellationToken,
}

impl RunContext {
    /// Fresh context with a random suffix.
    #[must_use]
    pub fn new() -> Self {
        Self::with_suffix(&generate_suffix(&mut rand::thread_rng()))
    }

    /// Context with a caller-chosen suffix.
    #[must_use]
    pub fn with_suffix(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            cancel: CancellationToken::new(),
        }
    }

    /// Fail if the run has been cancelled.
    ///
    /// # Errors
    ///
    /// Returns `DeploymentFatalError::Cancelled` once the token is cancelled.
    pub fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(DeploymentFatalError::Cancelled.into());
        }
        Ok(())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
