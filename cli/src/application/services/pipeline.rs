//! Application service: the end-to-end deployment pipeline.
//!
//! acquire → analyze → generate → provision → rewrite → deploy. Each stage
//! consumes only the previous stage's output and nothing is retried across
//! stages. Fatal errors carry a [`StageFailure`] context naming the stage.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::context::RunContext;
use crate::application::ports::{DeployEnvironment, ProgressReporter};
use crate::application::services::acquire::{AcquiredRepo, acquire};
use crate::application::services::analyze::analyze;
use crate::application::services::deploy::{DeployOptions, deploy};
use crate::application::services::intent::ResolvedTarget;
use crate::application::services::provision::provision;
use crate::application::services::rewrite::rewrite_entry_point;
use crate::domain::analysis::RepoAnalysis;
use crate::domain::config::AutoshipConfig;
use crate::domain::deploy::DeployReport;
use crate::domain::error::{Stage, StageFailure};
use crate::domain::framework::Framework;
use crate::domain::source::SourceSpec;
use crate::domain::terraform::{Provider, ProvisioningConfig, TerraformSettings, generate_config};

/// Everything decided before any cloud resource is created.
#[derive(Debug)]
pub struct PreparedDeployment {
    pub repo: AcquiredRepo,
    pub analysis: RepoAnalysis,
    pub config: ProvisioningConfig,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    pub url: String,
    pub public_address: String,
    pub framework: Framework,
    pub primary_port: u16,
    /// Provisioning workspace left on disk for teardown.
    pub terraform_workspace: PathBuf,
    pub rewrote_entry_point: bool,
    pub report: DeployReport,
}

fn at(stage: Stage) -> StageFailure {
    StageFailure { stage }
}

/// Acquire and analyze only.
///
/// # Errors
///
/// Fails in the acquire stage; analysis itself never fails.
pub async fn inspect(
    env: &impl DeployEnvironment,
    reporter: &impl ProgressReporter,
    ctx: &RunContext,
    source: Option<&SourceSpec>,
    framework: Option<Framework>,
) -> Result<(AcquiredRepo, RepoAnalysis)> {
    ctx.ensure_active().context(at(Stage::Acquire))?;
    let repo = acquire(source, env, env, env, env, reporter)
        .await
        .context(at(Stage::Acquire))?;
    ctx.ensure_active().context(at(Stage::Analyze))?;
    let analysis = analyze(&repo, framework, env, env, reporter).await;
    Ok((repo, analysis))
}

/// Acquire, analyze and generate the provisioning payload.
///
/// # Errors
///
/// Fails in the acquire stage, or when the run is cancelled.
pub async fn prepare(
    env: &impl DeployEnvironment,
    reporter: &impl ProgressReporter,
    ctx: &RunContext,
    config: &AutoshipConfig,
    source: Option<&SourceSpec>,
    target: &ResolvedTarget,
) -> Result<PreparedDeployment> {
    let (repo, analysis) = inspect(env, reporter, ctx, source, target.framework).await?;

    ctx.ensure_active().context(at(Stage::Generate))?;
    let provider = Provider::from_name(&target.provider);
    let settings = TerraformSettings {
        region: config.aws.region.clone(),
        ami: config.aws.ami.clone(),
    };
    let generated = generate_config(
        &provider,
        &analysis,
        &target.instance_size,
        &ctx.suffix,
        &settings,
    );
    tracing::info!(
        provider = %generated.provider,
        suffix = %generated.suffix,
        ports = ?generated.ingress_ports,
        "provisioning config generated"
    );

    Ok(PreparedDeployment {
        repo,
        analysis,
        config: generated,
    })
}

/// Provision the prepared infrastructure and deploy onto it.
///
/// # Errors
///
/// Fails in the provision stage (including inconsistent outputs, which never
/// lead to a connection attempt) or the deploy stage.
pub async fn execute(
    env: &impl DeployEnvironment,
    reporter: &impl ProgressReporter,
    ctx: &RunContext,
    config: &AutoshipConfig,
    prepared: PreparedDeployment,
) -> Result<DeploymentSummary> {
    let PreparedDeployment {
        repo,
        analysis,
        config: provisioning,
    } = prepared;

    ctx.ensure_active().context(at(Stage::Provision))?;
    let outcome = provision(&provisioning, env, env, env, reporter)
        .await
        .context(at(Stage::Provision))?;
    let workspace = outcome.workspace;
    let credentials = outcome
        .result
        .into_credentials()
        .map_err(anyhow::Error::from)
        .with_context(|| {
            format!(
                "instance may still be running; tear down with: terraform -chdir={} destroy",
                workspace.display()
            )
        })
        .context(at(Stage::Provision))?;
    let public_address = credentials.address.to_string();

    let rewrote = rewrite_entry_point(&repo.code_path, &analysis, &public_address, env, reporter);

    ctx.ensure_active().context(at(Stage::Deploy))?;
    let report = deploy(
        env,
        env,
        env,
        reporter,
        ctx,
        DeployOptions {
            credentials: &credentials,
            ssh_user: &config.aws.ssh_user,
            code_path: &repo.code_path,
            root_name: &repo.root_name,
            analysis: &analysis,
            settings: &config.deploy,
        },
    )
    .await
    .context(at(Stage::Deploy))?;

    let primary_port = analysis.primary_port();
    Ok(DeploymentSummary {
        url: format!("http://{public_address}:{primary_port}/"),
        public_address,
        framework: analysis.framework,
        primary_port,
        terraform_workspace: workspace,
        rewrote_entry_point: rewrote,
        report,
    })
}

/// Run the whole pipeline without pausing between preparation and provisioning.
///
/// # Errors
///
/// See [`prepare`] and [`execute`].
pub async fn run_pipeline(
    env: &impl DeployEnvironment,
    reporter: &impl ProgressReporter,
    ctx: &RunContext,
    config: &AutoshipConfig,
    source: Option<&SourceSpec>,
    target: &ResolvedTarget,
) -> Result<DeploymentSummary> {
    let prepared = prepare(env, reporter, ctx, config, source, target).await?;
    execute(env, reporter, ctx, config, prepared).await
}

/// Stage a pipeline error is attributed to, if any.
#[must_use]
pub fn failed_stage(err: &anyhow::Error) -> Option<Stage> {
    err.downcast_ref::<StageFailure>().map(|f| f.stage)
}
