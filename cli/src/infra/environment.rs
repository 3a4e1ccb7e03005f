//! Production wiring of every port the pipeline needs.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{
    ArchiveExtractor, ConnectTarget, IntentClassifier, LocalFs, Pause, ProvisioningTool,
    ScratchSpace, ShellConnector, StructureClassifier, VersionControl,
};
use crate::domain::classify::StructureRequest;
use crate::domain::config::AutoshipConfig;
use crate::domain::source::TopLevelEntry;
use crate::domain::tree::{ListedPath, TreeNode};
use crate::infra::archive::LocalArchiveExtractor;
use crate::infra::classifier::Classifier;
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::infra::fs::{HostFs, TempScratch};
use crate::infra::git::GitCli;
use crate::infra::pause::TokioPause;
use crate::infra::ssh::{OpenSshConnector, OpenSshSession};
use crate::infra::terraform::TerraformCli;

/// The real machine: local processes, disk, network and clock.
pub struct HostEnvironment {
    git: GitCli<TokioCommandRunner>,
    archives: LocalArchiveExtractor,
    scratch: TempScratch,
    fs: HostFs,
    classifier: Classifier,
    terraform: TerraformCli<TokioCommandRunner>,
    ssh: OpenSshConnector<TokioCommandRunner>,
    clock: TokioPause,
}

impl HostEnvironment {
    /// Build the adapters from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the classifier's HTTP client cannot be built.
    pub fn from_config(config: &AutoshipConfig) -> Result<Self> {
        let runner = TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT);
        Ok(Self {
            git: GitCli::new(runner.clone()),
            archives: LocalArchiveExtractor,
            scratch: TempScratch,
            fs: HostFs,
            classifier: Classifier::from_config(&config.classifier)?,
            terraform: TerraformCli::new(
                runner.clone(),
                config.terraform.binary.clone(),
                Duration::from_secs(config.terraform.apply_timeout_secs),
            ),
            ssh: OpenSshConnector::new(
                runner,
                Duration::from_secs(config.deploy.command_timeout_secs),
            ),
            clock: TokioPause,
        })
    }
}

impl VersionControl for HostEnvironment {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<Output> {
        self.git.clone_repo(url, dest).await
    }
}

impl ArchiveExtractor for HostEnvironment {
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        self.archives.extract(archive, dest).await
    }
}

impl ScratchSpace for HostEnvironment {
    fn create(&self, label: &str) -> Result<(PathBuf, Box<dyn Any + Send>)> {
        self.scratch.create(label)
    }

    fn create_retained(&self, label: &str) -> Result<PathBuf> {
        self.scratch.create_retained(label)
    }
}

impl LocalFs for HostEnvironment {
    fn top_level_entries(&self, dir: &Path) -> Result<Vec<TopLevelEntry>> {
        self.fs.top_level_entries(dir)
    }

    fn tree(&self, root: &Path) -> Result<TreeNode> {
        self.fs.tree(root)
    }

    fn walk(&self, root: &Path) -> Result<Vec<ListedPath>> {
        self.fs.walk(root)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.fs.read_to_string(path)
    }

    fn write_string(&self, path: &Path, content: &str) -> Result<()> {
        self.fs.write_string(path, content)
    }
}

impl IntentClassifier for HostEnvironment {
    async fn classify_intent(&self, text: &str) -> Result<String> {
        self.classifier.classify_intent(text).await
    }
}

impl StructureClassifier for HostEnvironment {
    async fn classify_structure(&self, request: &StructureRequest) -> Result<String> {
        self.classifier.classify_structure(request).await
    }
}

impl ProvisioningTool for HostEnvironment {
    async fn version(&self) -> Result<Output> {
        self.terraform.version().await
    }

    async fn init(&self, workspace: &Path) -> Result<Output> {
        self.terraform.init(workspace).await
    }

    async fn apply(&self, workspace: &Path) -> Result<Output> {
        self.terraform.apply(workspace).await
    }

    async fn outputs(&self, workspace: &Path) -> Result<Output> {
        self.terraform.outputs(workspace).await
    }
}

impl ShellConnector for HostEnvironment {
    type Session = OpenSshSession<TokioCommandRunner>;

    async fn connect(&self, target: &ConnectTarget<'_>) -> Result<Self::Session> {
        self.ssh.connect(target).await
    }
}

impl Pause for HostEnvironment {
    async fn pause(&self, duration: Duration) {
        self.clock.pause(duration).await;
    }
}
