//! Remote deployment model: states, per-step outcomes, and the shell
//! commands each state issues.
//!
//! Command builders are pure so the exact remote command lines can be
//! asserted in tests without a host.

use std::fmt;

use serde::Serialize;

use crate::domain::analysis::RepoAnalysis;
use crate::domain::error::DeploymentAdvisoryError;
use crate::domain::framework::{Framework, InstallKind, LaunchKind, RuntimeStrategy};

/// Remote directory name used when acquisition produced no root name.
pub const FALLBACK_ROOT_NAME: &str = "app";

/// Log file the launched process writes to, inside its working directory.
pub const APP_LOG: &str = "app.log";

/// Locks held by dpkg/apt while a package operation runs.
const PACKAGE_LOCKS: &str =
    "/var/lib/dpkg/lock-frontend /var/lib/dpkg/lock /var/lib/apt/lists/lock";

/// Remote deployer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    AwaitingReachability,
    Uploading,
    ToolchainCheck,
    DependencyInstall,
    Launching,
    Confirmed,
    Failed,
}

impl DeployState {
    /// Successor on the happy path. `Confirmed` and `Failed` are terminal.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::AwaitingReachability => Some(Self::Uploading),
            Self::Uploading => Some(Self::ToolchainCheck),
            Self::ToolchainCheck => Some(Self::DependencyInstall),
            Self::DependencyInstall => Some(Self::Launching),
            Self::Launching => Some(Self::Confirmed),
            Self::Confirmed | Self::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingReachability => "awaiting reachability",
            Self::Uploading => "uploading",
            Self::ToolchainCheck => "toolchain check",
            Self::DependencyInstall => "dependency install",
            Self::Launching => "launching",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Individual remote operation, recorded for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStep {
    Connect,
    Mkdir,
    Upload,
    LockWait,
    ToolchainProbe,
    ToolchainInstall,
    DependencyInstall,
    Launch,
    ProcessListing,
}

/// Exit code and captured stderr of one remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: DeployStep,
    /// `None` when the remote process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl StepOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Result of a remote deployment that reached `Confirmed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub remote_root: String,
    pub files_uploaded: usize,
    pub steps: Vec<StepOutcome>,
    pub advisories: Vec<DeploymentAdvisoryError>,
    /// Output of the diagnostic process listing; informational only.
    pub process_listing: String,
}

// ── Remote layout ─────────────────────────────────────────────────────────────

/// Where the project lives on the remote host and how to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlan {
    pub framework: Framework,
    pub strategy: RuntimeStrategy,
    /// Absolute remote project root, without a trailing slash.
    pub remote_root: String,
    pub manifest: Option<String>,
    pub entry_point: String,
    pub primary_port: u16,
}

impl RemotePlan {
    /// Lay out the deployment under `/home/<user>/<root name>`.
    #[must_use]
    pub fn new(analysis: &RepoAnalysis, ssh_user: &str, root_name: &str) -> Self {
        let dir = if root_name.is_empty() {
            FALLBACK_ROOT_NAME
        } else {
            root_name
        };
        let strategy = analysis.framework.strategy();
        Self {
            framework: analysis.framework,
            strategy,
            remote_root: format!("/home/{ssh_user}/{dir}"),
            manifest: analysis.dependency_manifest.clone(),
            entry_point: analysis
                .main_file
                .clone()
                .unwrap_or_else(|| strategy.fallback_entry.to_string()),
            primary_port: analysis.primary_port(),
        }
    }

    /// Absolute remote path of a `/`-separated project-relative path.
    #[must_use]
    pub fn remote_path(&self, relative: &str) -> String {
        let relative = relative.trim_start_matches("./").trim_matches('/');
        if relative.is_empty() {
            self.remote_root.clone()
        } else {
            format!("{}/{relative}", self.remote_root)
        }
    }

    /// Remote directory containing a project-relative file.
    fn remote_dir_of(&self, relative: &str) -> String {
        match relative.rsplit_once('/') {
            Some((dir, _)) => self.remote_path(dir),
            None => self.remote_root.clone(),
        }
    }

    /// Directory the Node package manager runs in: next to `package.json`.
    fn node_dir(&self) -> String {
        self.manifest
            .as_deref()
            .map_or_else(|| self.remote_root.clone(), |m| self.remote_dir_of(m))
    }

    /// Dependency install command, or the advisory explaining why none runs.
    ///
    /// # Errors
    ///
    /// Returns `NoManifest` for Python projects without a manifest.
    pub fn install_command(&self) -> Result<String, DeploymentAdvisoryError> {
        match self.strategy.install {
            InstallKind::PipRequirements => {
                let manifest = self
                    .manifest
                    .as_deref()
                    .ok_or(DeploymentAdvisoryError::NoManifest)?;
                Ok(format!(
                    "sudo python3 -m pip install -r {}",
                    shell_quote(&self.remote_path(manifest))
                ))
            }
            InstallKind::NpmInstall => Ok(format!(
                "cd {} && npm install",
                shell_quote(&self.node_dir())
            )),
        }
    }

    /// Detached launch command; the process outlives the SSH session.
    #[must_use]
    pub fn launch_command(&self) -> String {
        let (dir, program) = match self.strategy.launch {
            LaunchKind::PythonEntryPoint => (
                self.remote_dir_of(&self.entry_point),
                format!("python3 {}", shell_quote(file_name(&self.entry_point))),
            ),
            LaunchKind::DjangoManage => (
                self.remote_dir_of(&self.entry_point),
                format!(
                    "python3 {} runserver 0.0.0.0:{}",
                    shell_quote(file_name(&self.entry_point)),
                    self.primary_port
                ),
            ),
            LaunchKind::NpmStart => (self.node_dir(), "npm start".to_string()),
        };
        detached(&dir, &program)
    }

    /// Probe for the framework's package-manager binary.
    #[must_use]
    pub fn toolchain_probe_command(&self) -> String {
        format!("command -v {}", self.strategy.toolchain_binary)
    }

    /// Install the package-manager binary through the system package manager.
    #[must_use]
    pub fn toolchain_install_command(&self) -> String {
        format!(
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y {}",
            self.strategy.toolchain_package
        )
    }

    /// Diagnostic process listing.
    #[must_use]
    pub fn process_listing_command(&self) -> String {
        format!(
            "ps aux | grep -E {} | grep -v grep",
            shell_quote(self.strategy.process_pattern)
        )
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn detached(dir: &str, program: &str) -> String {
    format!(
        "cd {} && {{ nohup setsid {program} > {APP_LOG} 2>&1 < /dev/null & }}",
        shell_quote(dir)
    )
}

// ── Package lock ──────────────────────────────────────────────────────────────

/// Prints `locked` while any dpkg/apt lock is held, `free` otherwise.
#[must_use]
pub fn package_lock_probe_command() -> String {
    format!("if sudo fuser {PACKAGE_LOCKS} >/dev/null 2>&1; then echo locked; else echo free; fi")
}

/// Interpret the lock probe's stdout.
#[must_use]
pub fn lock_is_free(probe_stdout: &str) -> bool {
    probe_stdout.trim() == "free"
}

/// Create a remote directory; fails if it already exists.
#[must_use]
pub fn mkdir_command(path: &str) -> String {
    format!("mkdir -- {}", shell_quote(path))
}

/// `true` when a failed `mkdir` only reports a pre-existing directory.
#[must_use]
pub fn is_already_exists(stderr: &str) -> bool {
    stderr.contains("File exists")
}

/// Quote a string for a POSIX shell using single quotes.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-:=@+,".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
