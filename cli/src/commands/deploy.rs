//! `autoship deploy`: acquire, analyze, provision and deploy.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::context::RunContext;
use crate::application::services::intent::resolve_target;
use crate::application::services::pipeline::{execute, prepare};
use crate::commands::{SourceArgs, TargetArgs};

/// Arguments for the deploy command.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Run the deploy command.
///
/// # Errors
///
/// Returns the first fatal pipeline error, tagged with the failed stage.
pub async fn run(app: &AppContext, args: DeployArgs, run: &RunContext) -> Result<ExitCode> {
    let (config, env) = app.environment()?;
    let reporter = app.reporter();

    let target = resolve_target(args.target.into(), &env, &reporter).await;
    tracing::info!(
        provider = %target.provider,
        size = %target.instance_size,
        framework = ?target.framework,
        "deployment target resolved"
    );

    let source = args.source.spec();
    let prepared = prepare(&env, &reporter, run, &config, source.as_ref(), &target).await?;

    if prepared.config.provider.is_supported() {
        app.output.kv("Provider: ", &prepared.config.provider.to_string());
        app.output.kv("Instance: ", &prepared.config.instance_size);
        app.output.kv("Framework:", prepared.analysis.framework.as_str());
        let prompt = format!(
            "Create a {} instance in {}? This provisions billable cloud resources",
            prepared.config.instance_size, prepared.config.region
        );
        if !app.confirm(&prompt, true)? {
            app.output.info("Aborted; nothing was provisioned.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let summary = execute(&env, &reporter, run, &config, prepared).await?;
    drop(reporter);
    app.renderer().render_summary(&summary)?;
    Ok(ExitCode::SUCCESS)
}
