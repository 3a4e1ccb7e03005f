//! Command implementations

pub mod analyze;
pub mod config;
pub mod deploy;
pub mod plan;
pub mod version;

use std::path::PathBuf;

use clap::Args;

use crate::application::services::intent::TargetFlags;
use crate::domain::framework::Framework;
use crate::domain::source::SourceSpec;

/// Where to take the application from. Exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Git repository URL to clone
    #[arg(long, value_name = "URL")]
    pub repo: Option<String>,

    /// Local zip, tar or tar.gz archive
    #[arg(long, value_name = "PATH")]
    pub archive: Option<PathBuf>,
}

impl SourceArgs {
    #[must_use]
    pub fn spec(&self) -> Option<SourceSpec> {
        SourceSpec::from_options(self.repo.clone(), self.archive.clone())
    }
}

/// Deployment target selection.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Instance size, e.g. t2.micro
    #[arg(long)]
    pub size: Option<String>,

    /// Cloud provider
    #[arg(long)]
    pub provider: Option<String>,

    /// Framework, skipping detection from the request
    #[arg(long)]
    pub framework: Option<Framework>,

    /// Free-form description, e.g. "flask app on a t2.small in aws"
    #[arg(long, value_name = "TEXT")]
    pub request: Option<String>,
}

impl From<TargetArgs> for TargetFlags {
    fn from(args: TargetArgs) -> Self {
        Self {
            provider: args.provider,
            size: args.size,
            framework: args.framework,
            request: args.request,
        }
    }
}
