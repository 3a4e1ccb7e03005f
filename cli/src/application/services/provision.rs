//! Application service: provisioner driver.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! No step is retried: a failed `init` or `apply` ends the run.

use std::path::PathBuf;
use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{LocalFs, ProgressReporter, ProvisioningTool, ScratchSpace};
use crate::domain::error::ProvisioningError;
use crate::domain::terraform::{
    ProvisionResult, ProvisioningConfig, Provider, check_tool_version, parse_outputs,
};

/// File name of the payload inside the provisioning workspace.
pub const PAYLOAD_FILE: &str = "main.tf";

/// What provisioning produced, and where its state lives.
#[derive(Debug)]
pub struct ProvisionOutcome {
    pub result: ProvisionResult,
    /// Retained workspace holding the tool's state, for manual teardown.
    pub workspace: PathBuf,
}

/// Provision the infrastructure described by `config`.
///
/// # Errors
///
/// Returns a [`ProvisioningError`] for unsupported providers (before any
/// process is spawned), a missing or outdated tool, and failed tool runs.
pub async fn provision(
    config: &ProvisioningConfig,
    tool: &impl ProvisioningTool,
    scratch: &impl ScratchSpace,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<ProvisionOutcome> {
    if let Provider::Unsupported(name) = &config.provider {
        return Err(ProvisioningError::UnsupportedProvider(name.clone()).into());
    }

    let version = tool
        .version()
        .await
        .map_err(|e| ProvisioningError::ToolUnavailable(format!("{e:#}")))?;
    if !version.status.success() {
        return Err(ProvisioningError::ToolUnavailable(stderr_of(&version)).into());
    }
    let found = check_tool_version(&String::from_utf8_lossy(&version.stdout))?;
    tracing::debug!(%found, "provisioning tool version");

    let workspace = scratch
        .create_retained("terraform")
        .context("creating provisioning workspace")?;
    fs.write_string(&workspace.join(PAYLOAD_FILE), &config.payload)
        .context("writing provisioning payload")?;
    tracing::info!(workspace = %workspace.display(), "provisioning workspace ready");

    reporter.step("initializing provisioning workspace...");
    let init = tool.init(&workspace).await?;
    if !init.status.success() {
        return Err(ProvisioningError::InitFailed {
            code: exit_code(&init),
            stderr: stderr_of(&init),
        }
        .into());
    }

    reporter.step(&format!(
        "provisioning {} instance in {} (this takes a few minutes)...",
        config.instance_size, config.region
    ));
    let apply = tool.apply(&workspace).await?;
    if !apply.status.success() {
        return Err(ProvisioningError::ApplyFailed {
            code: exit_code(&apply),
            stderr: stderr_of(&apply),
        }
        .into());
    }

    let outputs = tool.outputs(&workspace).await?;
    if !outputs.status.success() {
        return Err(ProvisioningError::OutputFailed {
            code: exit_code(&outputs),
            stderr: stderr_of(&outputs),
        }
        .into());
    }
    let result = parse_outputs(&String::from_utf8_lossy(&outputs.stdout))?;
    reporter.success("instance provisioned");

    Ok(ProvisionOutcome { result, workspace })
}

fn exit_code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
