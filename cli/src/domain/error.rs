//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, or `std::process`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ── Pipeline stages ───────────────────────────────────────────────────────────

/// Pipeline stage a fatal error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    Analyze,
    Generate,
    Provision,
    Deploy,
}

impl Stage {
    /// Short machine-readable tag, used as the JSON error `code`.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Acquire => "acquire",
            Self::Analyze => "analyze",
            Self::Generate => "generate",
            Self::Provision => "provision",
            Self::Deploy => "deploy",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Context attached to a fatal error so the top level can report the stage.
///
/// Recover it with `err.downcast_ref::<StageFailure>()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage failed", self.stage)
    }
}

// ── Acquisition errors ────────────────────────────────────────────────────────

/// Errors raised while obtaining the source tree.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("No source given. Pass --repo <url> or --archive <path>.")]
    NoSource,

    #[error("Cannot derive a project name from repository URL '{0}'.")]
    InvalidUrl(String),

    #[error("git clone of '{url}' failed:\n{stderr}")]
    CloneFailed { url: String, stderr: String },

    #[error("'{path}' is not a valid archive: {reason}")]
    InvalidArchive { path: String, reason: String },
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Errors raised by the provisioner driver. None of these are retried.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("Cloud provider '{0}' is not supported. Supported providers: aws")]
    UnsupportedProvider(String),

    #[error("Provisioning tool is unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Provisioning tool {found} is too old (need >= {required}).")]
    ToolTooOld { found: String, required: String },

    #[error("terraform init failed (exit {code}):\n{stderr}")]
    InitFailed { code: i32, stderr: String },

    #[error("terraform apply failed (exit {code}):\n{stderr}")]
    ApplyFailed { code: i32, stderr: String },

    #[error("terraform output failed (exit {code}):\n{stderr}")]
    OutputFailed { code: i32, stderr: String },

    #[error("terraform output is not valid JSON: {0}")]
    MalformedOutputs(String),

    #[error("Provisioning produced no public address and no private key.")]
    NoEndpoint,

    #[error(
        "Provisioning outputs are inconsistent: public address {address}, private key {key}. Refusing to connect."
    )]
    InconsistentOutputs {
        address: &'static str,
        key: &'static str,
    },

    #[error("Provisioned public address '{0}' is not an IPv4 address.")]
    InvalidAddress(String),
}

// ── Deployment errors ─────────────────────────────────────────────────────────

/// Errors that abort the remaining deployment states.
#[derive(Debug, Error)]
pub enum DeploymentFatalError {
    #[error("Host {host} did not become reachable over SSH: {reason}")]
    Unreachable { host: String, reason: String },

    #[error("Package manager still locked after all {attempts} attempts.")]
    LockTimeout { attempts: u32 },

    #[error("Transfer of '{path}' failed: {reason}")]
    Transfer { path: String, reason: String },

    #[error("Installing {package} failed (exit {code}):\n{stderr}")]
    Toolchain {
        package: String,
        code: i32,
        stderr: String,
    },

    #[error("Deployment cancelled.")]
    Cancelled,
}

/// Errors that are reported but never halt the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeploymentAdvisoryError {
    #[error("No dependency manifest found; skipped dependency install.")]
    NoManifest,

    #[error("Dependency install exited with {code}: {stderr}")]
    DependencyInstall { code: i32, stderr: String },

    #[error("Launch command exited with {code}: {stderr}")]
    Launch { code: i32, stderr: String },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}
