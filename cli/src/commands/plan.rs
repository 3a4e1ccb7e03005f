//! `autoship plan`: print the provisioning payload without applying it.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::context::RunContext;
use crate::application::services::intent::resolve_target;
use crate::application::services::pipeline::prepare;
use crate::commands::{SourceArgs, TargetArgs};

/// Arguments for the plan command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Run the plan command.
///
/// # Errors
///
/// Returns an error if the source cannot be acquired.
pub async fn run(app: &AppContext, args: PlanArgs, run: &RunContext) -> Result<ExitCode> {
    let (config, env) = app.environment()?;
    let reporter = app.reporter();
    let target = resolve_target(args.target.into(), &env, &reporter).await;
    let source = args.source.spec();
    let prepared = prepare(&env, &reporter, run, &config, source.as_ref(), &target).await?;
    drop(reporter);
    if !prepared.config.provider.is_supported() {
        app.output.warn(&format!(
            "provider '{}' is not supported; deploy would stop here",
            prepared.config.provider
        ));
    }
    app.renderer().render_plan(&prepared.config)?;
    Ok(ExitCode::SUCCESS)
}
