//! `ProvisioningTool` adapter for the `terraform` CLI.
//!
//! Every invocation is non-interactive and colourless. `apply` gets its own
//! (much longer) timeout because instance creation routinely takes minutes.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ProvisioningTool};

/// Infrastructure adapter that routes all terraform calls through a `CommandRunner`.
///
/// Generic over `R: CommandRunner` so that tests can inject a mock runner
/// without spawning real processes.
pub struct TerraformCli<R: CommandRunner> {
    runner: R,
    binary: String,
    apply_timeout: Duration,
}

impl<R: CommandRunner> TerraformCli<R> {
    pub fn new(runner: R, binary: impl Into<String>, apply_timeout: Duration) -> Self {
        Self {
            runner,
            binary: binary.into(),
            apply_timeout,
        }
    }

    fn chdir(workspace: &Path) -> String {
        format!("-chdir={}", workspace.display())
    }
}

impl<R: CommandRunner> ProvisioningTool for TerraformCli<R> {
    async fn version(&self) -> Result<Output> {
        self.runner
            .run(&self.binary, &["version", "-json"])
            .await
            .context("terraform version")
    }

    async fn init(&self, workspace: &Path) -> Result<Output> {
        let chdir = Self::chdir(workspace);
        self.runner
            .run(&self.binary, &[&chdir, "init", "-input=false", "-no-color"])
            .await
            .context("terraform init")
    }

    async fn apply(&self, workspace: &Path) -> Result<Output> {
        let chdir = Self::chdir(workspace);
        self.runner
            .run_with_timeout(
                &self.binary,
                &[&chdir, "apply", "-auto-approve", "-input=false", "-no-color"],
                self.apply_timeout,
            )
            .await
            .context("terraform apply")
    }

    async fn outputs(&self, workspace: &Path) -> Result<Output> {
        let chdir = Self::chdir(workspace);
        self.runner
            .run(&self.binary, &[&chdir, "output", "-json"])
            .await
            .context("terraform output")
    }
}
