//! `VersionControl` adapter that shells out to the `git` CLI.

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, VersionControl};

/// Routes clones through a `CommandRunner`.
pub struct GitCli<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> GitCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> VersionControl for GitCli<R> {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<Output> {
        let dest = dest.to_string_lossy();
        self.runner
            .run("git", &["clone", "--depth", "1", "--", url, &dest])
            .await
            .context("git clone")
    }
}
