//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`; never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::classify::StructureRequest;
use crate::domain::config::AutoshipConfig;
use crate::domain::source::TopLevelEntry;
use crate::domain::terraform::SshCredentials;
use crate::domain::tree::{ListedPath, TreeNode};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Acquisition Ports ─────────────────────────────────────────────────────────

/// Clones a repository.
#[allow(async_fn_in_trait)]
pub trait VersionControl {
    /// Shallow-clone `url` into `dest`, which must not exist yet.
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<Output>;
}

/// Unpacks a local archive.
#[allow(async_fn_in_trait)]
pub trait ArchiveExtractor {
    /// Extract `archive` into the existing directory `dest`.
    ///
    /// # Errors
    ///
    /// Returns `AcquisitionError::InvalidArchive` for unknown formats,
    /// corrupt containers, and entries that would escape `dest`.
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Scratch directories owned by a single run.
pub trait ScratchSpace {
    /// Create a fresh directory that is deleted when the guard is dropped.
    ///
    /// Returns `(path, guard)`.
    fn create(&self, label: &str) -> Result<(PathBuf, Box<dyn Any + Send>)>;
    /// Create a fresh directory that stays on disk after the run.
    fn create_retained(&self, label: &str) -> Result<PathBuf>;
}

/// Local filesystem access needed by the pipeline.
pub trait LocalFs {
    /// Immediate children of `dir`.
    fn top_level_entries(&self, dir: &Path) -> Result<Vec<TopLevelEntry>>;
    /// Full tree under `root`, `.git` excluded. Children are not sorted.
    fn tree(&self, root: &Path) -> Result<TreeNode>;
    /// Every path under `root` relative to it, `/`-separated, `.git`
    /// excluded, sorted so that each directory precedes its contents.
    fn walk(&self, root: &Path) -> Result<Vec<ListedPath>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write_string(&self, path: &Path, content: &str) -> Result<()>;
}

// ── Classifier Ports ──────────────────────────────────────────────────────────

/// Natural-language intent classifier.
///
/// Returns the raw answer; callers parse it and apply fallbacks.
#[allow(async_fn_in_trait)]
pub trait IntentClassifier {
    async fn classify_intent(&self, text: &str) -> Result<String>;
}

/// Repository structure classifier.
///
/// Returns the raw answer; callers parse and validate it.
#[allow(async_fn_in_trait)]
pub trait StructureClassifier {
    async fn classify_structure(&self, request: &StructureRequest) -> Result<String>;
}

// ── Provisioning Port ─────────────────────────────────────────────────────────

/// The external provisioning tool, driven one subcommand at a time.
#[allow(async_fn_in_trait)]
pub trait ProvisioningTool {
    /// Machine-readable tool version.
    async fn version(&self) -> Result<Output>;
    async fn init(&self, workspace: &Path) -> Result<Output>;
    async fn apply(&self, workspace: &Path) -> Result<Output>;
    /// Outputs of the applied workspace, as JSON.
    async fn outputs(&self, workspace: &Path) -> Result<Output>;
}

// ── Remote Shell Ports ────────────────────────────────────────────────────────

/// Everything needed to open a session to the provisioned host.
pub struct ConnectTarget<'a> {
    pub credentials: &'a SshCredentials,
    pub user: &'a str,
    pub connect_timeout: Duration,
}

/// Opens remote sessions.
#[allow(async_fn_in_trait)]
pub trait ShellConnector {
    type Session: RemoteSession;

    /// Make one connection attempt.
    async fn connect(&self, target: &ConnectTarget<'_>) -> Result<Self::Session>;
}

/// An open session on the remote host.
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    /// Run a shell command line and capture its output.
    async fn exec(&self, command: &str) -> Result<Output>;
    /// Create one remote directory (non-recursive).
    async fn mkdir(&self, path: &str) -> Result<Output>;
    /// Copy one local file to `remote`.
    async fn upload(&self, local: &Path, remote: &str) -> Result<Output>;
    /// Tear the session down. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

// ── Time Port ─────────────────────────────────────────────────────────────────

/// Waits between remote operations.
#[allow(async_fn_in_trait)]
pub trait Pause {
    async fn pause(&self, duration: Duration);
}

// ── Composite ─────────────────────────────────────────────────────────────────

/// Every port the deployment pipeline needs, bundled.
pub trait DeployEnvironment:
    VersionControl
    + ArchiveExtractor
    + ScratchSpace
    + LocalFs
    + IntentClassifier
    + StructureClassifier
    + ProvisioningTool
    + ShellConnector
    + Pause
{
}

/// Blanket implementation: any type implementing all the ports qualifies.
impl<T> DeployEnvironment for T where
    T: VersionControl
        + ArchiveExtractor
        + ScratchSpace
        + LocalFs
        + IntentClassifier
        + StructureClassifier
        + ProvisioningTool
        + ShellConnector
        + Pause
{
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, returning defaults when no file exists.
    fn load(&self) -> Result<AutoshipConfig>;
    /// Persist the configuration.
    fn save(&self, config: &AutoshipConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Synchronous.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
