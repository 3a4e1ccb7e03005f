//! JSON output helpers.
//!
//! Provides the error-object formatter used by all `--json` code paths when
//! a command fails, and the JSON renderer for successful results.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::services::pipeline::DeploymentSummary;
use crate::domain::analysis::RepoAnalysis;
use crate::domain::config::AutoshipConfig;
use crate::domain::terraform::ProvisioningConfig;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// `code` is the failed pipeline stage (`acquire`, `provision`, ...) or
/// `error` when the failure is not attributed to a stage.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Writes results as pretty-printed JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &impl Serialize) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_summary(&self, summary: &DeploymentSummary) -> Result<()> {
        Self::print(summary)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_analysis(&self, tree_listing: &str, analysis: &RepoAnalysis) -> Result<()> {
        Self::print(&serde_json::json!({
            "tree": tree_listing,
            "analysis": analysis,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_plan(&self, plan: &ProvisioningConfig) -> Result<()> {
        Self::print(plan)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config(&self, config: &AutoshipConfig, path: &Path) -> Result<()> {
        Self::print(&serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        Self::print(&serde_json::json!({ "version": version }))
    }
}
