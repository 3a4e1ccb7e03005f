//! `autoship analyze`: acquire and analyze without provisioning.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::context::RunContext;
use crate::application::services::pipeline::inspect;
use crate::commands::SourceArgs;
use crate::domain::framework::Framework;

/// Arguments for the analyze command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Framework hint passed to the structure classifier
    #[arg(long)]
    pub framework: Option<Framework>,
}

/// Run the analyze command.
///
/// # Errors
///
/// Returns an error if the source cannot be acquired.
pub async fn run(app: &AppContext, args: AnalyzeArgs, run: &RunContext) -> Result<ExitCode> {
    let (_, env) = app.environment()?;
    let reporter = app.reporter();
    let source = args.source.spec();
    let (repo, analysis) = inspect(&env, &reporter, run, source.as_ref(), args.framework).await?;
    drop(reporter);
    app.renderer().render_analysis(&repo.tree_listing, &analysis)?;
    Ok(ExitCode::SUCCESS)
}
