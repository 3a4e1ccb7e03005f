//! Application service: remote deployment state machine.
//!
//! One driver loop walks `DeployState` from `Uploading` to `Confirmed`.
//! Fatal errors move the run to `Failed`; advisories are collected and the
//! run continues. The session is closed on every exit path.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::context::RunContext;
use crate::application::ports::{
    ConnectTarget, LocalFs, Pause, ProgressReporter, RemoteSession, ShellConnector,
};
use crate::domain::analysis::RepoAnalysis;
use crate::domain::config::DeploySettings;
use crate::domain::deploy::{
    DeployReport, DeployState, DeployStep, RemotePlan, StepOutcome, is_already_exists,
    lock_is_free, mkdir_command, package_lock_probe_command,
};
use crate::domain::error::{DeploymentAdvisoryError, DeploymentFatalError};
use crate::domain::terraform::SshCredentials;

/// Inputs of one remote deployment.
pub struct DeployOptions<'a> {
    pub credentials: &'a SshCredentials,
    pub ssh_user: &'a str,
    /// Local project root to upload.
    pub code_path: &'a Path,
    pub root_name: &'a str,
    pub analysis: &'a RepoAnalysis,
    pub settings: &'a DeploySettings,
}

/// Deploy the acquired project onto the provisioned host.
///
/// # Errors
///
/// Returns a [`DeploymentFatalError`] when the host is unreachable, an upload
/// fails, the package manager stays locked, or the toolchain cannot be
/// installed. Advisories never produce an error; they are in the report.
pub async fn deploy(
    connector: &impl ShellConnector,
    fs: &impl LocalFs,
    pause: &impl Pause,
    reporter: &impl ProgressReporter,
    ctx: &RunContext,
    opts: DeployOptions<'_>,
) -> Result<DeployReport> {
    let host = opts.credentials.address.to_string();
    let settings = opts.settings;

    // AwaitingReachability: one flat wait, one attempt.
    reporter.step(&format!(
        "waiting {}s for {host} to accept SSH...",
        settings.reachability_delay_secs
    ));
    pause
        .pause(Duration::from_secs(settings.reachability_delay_secs))
        .await;
    ctx.ensure_active()?;
    let target = ConnectTarget {
        credentials: opts.credentials,
        user: opts.ssh_user,
        connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
    };
    let session = connector
        .connect(&target)
        .await
        .map_err(|e| DeploymentFatalError::Unreachable {
            host: host.clone(),
            reason: format!("{e:#}"),
        })?;
    reporter.success(&format!("connected to {host}"));

    let plan = RemotePlan::new(opts.analysis, opts.ssh_user, opts.root_name);
    let mut run = DeployRun {
        session: &session,
        plan,
        settings,
        report: DeployReport {
            remote_root: String::new(),
            files_uploaded: 0,
            steps: vec![StepOutcome {
                step: DeployStep::Connect,
                exit_code: Some(0),
                stderr: String::new(),
            }],
            advisories: Vec::new(),
            process_listing: String::new(),
        },
    };
    run.report.remote_root.clone_from(&run.plan.remote_root);

    let result = run.drive(opts.code_path, fs, pause, reporter, ctx).await;

    if let Err(e) = session.close().await {
        tracing::warn!(error = %format!("{e:#}"), "closing remote session failed");
    }
    result.map(|()| run.report)
}

struct DeployRun<'a, S: RemoteSession> {
    session: &'a S,
    plan: RemotePlan,
    settings: &'a DeploySettings,
    report: DeployReport,
}

impl<S: RemoteSession> DeployRun<'_, S> {
    async fn drive(
        &mut self,
        code_path: &Path,
        fs: &impl LocalFs,
        pause: &impl Pause,
        reporter: &impl ProgressReporter,
        ctx: &RunContext,
    ) -> Result<()> {
        let mut state = DeployState::Uploading;
        while let Some(next) = state.next() {
            tracing::info!(%state, "deploy state");
            let entered = match ctx.ensure_active() {
                Ok(()) => self.enter(state, code_path, fs, pause, reporter).await,
                Err(e) => Err(e),
            };
            if let Err(e) = entered {
                tracing::warn!(failed_in = %state, state = %DeployState::Failed, "deploy state");
                return Err(e);
            }
            state = next;
        }
        tracing::info!(%state, "deploy state");
        self.confirm(reporter).await;
        Ok(())
    }

    async fn enter(
        &mut self,
        state: DeployState,
        code_path: &Path,
        fs: &impl LocalFs,
        pause: &impl Pause,
        reporter: &impl ProgressReporter,
    ) -> Result<()> {
        match state {
            DeployState::Uploading => self.upload(code_path, fs, reporter).await,
            DeployState::ToolchainCheck => self.toolchain(pause, reporter).await,
            DeployState::DependencyInstall => self.install(reporter).await,
            DeployState::Launching => self.launch(reporter).await,
            DeployState::AwaitingReachability | DeployState::Confirmed | DeployState::Failed => {
                Ok(())
            }
        }
    }

    fn record(&mut self, step: DeployStep, output: &Output) {
        self.report.steps.push(StepOutcome {
            step,
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    fn advise(&mut self, advisory: DeploymentAdvisoryError, reporter: &impl ProgressReporter) {
        tracing::warn!(%advisory, "deployment advisory");
        reporter.warn(&advisory.to_string());
        self.report.advisories.push(advisory);
    }

    // ── Uploading ────────────────────────────────────────────────────────────

    async fn upload(
        &mut self,
        code_path: &Path,
        fs: &impl LocalFs,
        reporter: &impl ProgressReporter,
    ) -> Result<()> {
        let entries = fs.walk(code_path).context("walking project tree")?;
        reporter.step(&format!("uploading project to {}...", self.plan.remote_root));

        let root = self.plan.remote_root.clone();
        self.make_dir(&root).await?;
        let mut files = 0usize;
        for entry in &entries {
            let remote = self.plan.remote_path(&entry.path);
            if entry.is_dir {
                self.make_dir(&remote).await?;
                continue;
            }
            let local = code_path.join(&entry.path);
            tracing::debug!(local = %local.display(), %remote, "upload");
            let output = self
                .session
                .upload(&local, &remote)
                .await
                .map_err(|e| DeploymentFatalError::Transfer {
                    path: entry.path.clone(),
                    reason: format!("{e:#}"),
                })?;
            if !output.status.success() {
                self.record(DeployStep::Upload, &output);
                return Err(DeploymentFatalError::Transfer {
                    path: entry.path.clone(),
                    reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                }
                .into());
            }
            files += 1;
        }

        self.report.files_uploaded = files;
        self.report.steps.push(StepOutcome {
            step: DeployStep::Upload,
            exit_code: Some(0),
            stderr: String::new(),
        });
        reporter.success(&format!("uploaded {files} files"));
        Ok(())
    }

    async fn make_dir(&mut self, remote: &str) -> Result<()> {
        let output = self
            .session
            .mkdir(remote)
            .await
            .map_err(|e| DeploymentFatalError::Transfer {
                path: remote.to_string(),
                reason: format!("{e:#}"),
            })?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_already_exists(&stderr) {
            tracing::debug!(%remote, "remote directory already exists");
            return Ok(());
        }
        self.record(DeployStep::Mkdir, &output);
        Err(DeploymentFatalError::Transfer {
            path: remote.to_string(),
            reason: format!("{}: {}", mkdir_command(remote), stderr.trim()),
        }
        .into())
    }

    // ── ToolchainCheck ───────────────────────────────────────────────────────

    async fn toolchain(&mut self, pause: &impl Pause, reporter: &impl ProgressReporter) -> Result<()> {
        self.wait_for_package_lock(pause, reporter).await?;

        let binary = self.plan.strategy.toolchain_binary;
        let probe = self
            .session
            .exec(&self.plan.toolchain_probe_command())
            .await
            .with_context(|| format!("probing for {binary}"))?;
        self.record(DeployStep::ToolchainProbe, &probe);
        if probe.status.success() {
            tracing::debug!(%binary, "toolchain present");
            return Ok(());
        }

        let package = self.plan.strategy.toolchain_package;
        reporter.step(&format!("installing {package}..."));
        let install = self
            .session
            .exec(&self.plan.toolchain_install_command())
            .await
            .with_context(|| format!("installing {package}"))?;
        self.record(DeployStep::ToolchainInstall, &install);
        if !install.status.success() {
            return Err(DeploymentFatalError::Toolchain {
                package: package.to_string(),
                code: install.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&install.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Poll the package locks. Fails only after the final attempt.
    async fn wait_for_package_lock(
        &mut self,
        pause: &impl Pause,
        reporter: &impl ProgressReporter,
    ) -> Result<()> {
        let attempts = self.settings.lock_max_attempts.max(1);
        let interval = Duration::from_secs(self.settings.lock_poll_interval_secs);
        let probe_command = package_lock_probe_command();

        for attempt in 1..=attempts {
            let probe = self
                .session
                .exec(&probe_command)
                .await
                .context("probing package manager locks")?;
            if probe.status.success() && lock_is_free(&String::from_utf8_lossy(&probe.stdout)) {
                self.record(DeployStep::LockWait, &probe);
                return Ok(());
            }
            if attempt == attempts {
                self.record(DeployStep::LockWait, &probe);
                break;
            }
            tracing::debug!(attempt, attempts, "package manager locked");
            reporter.step(&format!(
                "package manager busy, retrying in {}s ({attempt}/{attempts})",
                interval.as_secs()
            ));
            pause.pause(interval).await;
        }
        Err(DeploymentFatalError::LockTimeout { attempts }.into())
    }

    // ── DependencyInstall ────────────────────────────────────────────────────

    async fn install(&mut self, reporter: &impl ProgressReporter) -> Result<()> {
        let command = match self.plan.install_command() {
            Ok(command) => command,
            Err(advisory) => {
                self.advise(advisory, reporter);
                return Ok(());
            }
        };
        reporter.step("installing dependencies...");
        let output = self
            .session
            .exec(&command)
            .await
            .context("installing dependencies")?;
        self.record(DeployStep::DependencyInstall, &output);
        if output.status.success() {
            reporter.success("dependencies installed");
        } else {
            self.advise(
                DeploymentAdvisoryError::DependencyInstall {
                    code: output.status.code().unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                },
                reporter,
            );
        }
        Ok(())
    }

    // ── Launching ────────────────────────────────────────────────────────────

    async fn launch(&mut self, reporter: &impl ProgressReporter) -> Result<()> {
        reporter.step(&format!("starting {}...", self.plan.entry_point));
        let output = self
            .session
            .exec(&self.plan.launch_command())
            .await
            .context("launching application")?;
        self.record(DeployStep::Launch, &output);
        if !output.status.success() {
            self.advise(
                DeploymentAdvisoryError::Launch {
                    code: output.status.code().unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                },
                reporter,
            );
        }
        Ok(())
    }

    // ── Confirmed ────────────────────────────────────────────────────────────

    async fn confirm(&mut self, reporter: &impl ProgressReporter) {
        match self.session.exec(&self.plan.process_listing_command()).await {
            Ok(output) => {
                self.record(DeployStep::ProcessListing, &output);
                self.report.process_listing = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if self.report.process_listing.is_empty() {
                    reporter.warn("no matching process found yet; check app.log on the host");
                } else {
                    reporter.success("application process is running");
                }
            }
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "process listing failed"),
        }
    }
}
