//! OpenSSH-backed remote shell.
//!
//! `connect` starts one multiplexing master (`ssh -M -fN`) and every later
//! `exec`/`upload` rides on its control socket, so the host is dialled exactly
//! once per deployment. The private key and the control socket live in a
//! private temp directory that disappears with the session.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::application::ports::{CommandRunner, ConnectTarget, RemoteSession, ShellConnector};
use crate::domain::deploy::mkdir_command;

/// Extra time granted to the master process on top of `ConnectTimeout`.
const CONNECT_GRACE: Duration = Duration::from_secs(10);

/// Timeout for tearing down the master connection.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(15);

/// Opens [`OpenSshSession`]s through a `CommandRunner`.
#[derive(Clone)]
pub struct OpenSshConnector<R: CommandRunner + Clone> {
    runner: R,
    command_timeout: Duration,
}

impl<R: CommandRunner + Clone> OpenSshConnector<R> {
    /// `command_timeout` bounds every remote command and every upload.
    pub fn new(runner: R, command_timeout: Duration) -> Self {
        Self {
            runner,
            command_timeout,
        }
    }
}

/// Options shared by the master and by `scp`.
fn base_options(dir: &Path, key: &Path, connect_timeout: Duration) -> Vec<String> {
    vec![
        "-i".to_string(),
        key.display().to_string(),
        "-o".to_string(),
        "IdentitiesOnly=yes".to_string(),
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=accept-new".to_string(),
        "-o".to_string(),
        format!("UserKnownHostsFile={}", dir.join("known_hosts").display()),
        "-o".to_string(),
        format!("ConnectTimeout={}", connect_timeout.as_secs().max(1)),
    ]
}

fn write_private_key(path: &Path, pem: &str) -> Result<()> {
    let mut content = pem.to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("set permissions on {}", path.display()))?;
    }
    Ok(())
}

impl<R: CommandRunner + Clone> ShellConnector for OpenSshConnector<R> {
    type Session = OpenSshSession<R>;

    async fn connect(&self, target: &ConnectTarget<'_>) -> Result<Self::Session> {
        let dir = tempfile::Builder::new()
            .prefix("autoship-ssh-")
            .tempdir()
            .context("creating ssh scratch directory")?;
        let key = dir.path().join("id");
        write_private_key(&key, &target.credentials.private_key)?;
        let control = dir.path().join("ctl");
        let destination = format!("{}@{}", target.user, target.credentials.address);

        let mut args = vec![
            "-M".to_string(),
            "-S".to_string(),
            control.display().to_string(),
            "-fN".to_string(),
        ];
        args.extend(base_options(dir.path(), &key, target.connect_timeout));
        args.push(destination.clone());
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();

        tracing::info!(%destination, "opening ssh master connection");
        let output = self
            .runner
            .run_with_timeout("ssh", &argv, target.connect_timeout + CONNECT_GRACE)
            .await
            .context("ssh master connection")?;
        if !output.status.success() {
            anyhow::bail!(
                "ssh exited with {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(OpenSshSession {
            runner: self.runner.clone(),
            key,
            control,
            destination,
            command_timeout: self.command_timeout,
            connect_timeout: target.connect_timeout,
            closed: AtomicBool::new(false),
            scratch: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }
}

/// One multiplexed connection to the deployment host.
pub struct OpenSshSession<R: CommandRunner> {
    runner: R,
    key: PathBuf,
    control: PathBuf,
    destination: String,
    command_timeout: Duration,
    connect_timeout: Duration,
    closed: AtomicBool,
    scratch: PathBuf,
    /// Holds the key and control socket; `None` only while dropping.
    dir: Option<TempDir>,
}

impl<R: CommandRunner> OpenSshSession<R> {
    fn control_arg(&self) -> String {
        self.control.display().to_string()
    }

    fn exit_args(&self) -> [String; 5] {
        [
            "-S".to_string(),
            self.control_arg(),
            "-O".to_string(),
            "exit".to_string(),
            self.destination.clone(),
        ]
    }
}

impl<R: CommandRunner> RemoteSession for OpenSshSession<R> {
    async fn exec(&self, command: &str) -> Result<Output> {
        tracing::debug!(destination = %self.destination, %command, "remote exec");
        let control = self.control_arg();
        self.runner
            .run_with_timeout(
                "ssh",
                &[
                    "-S",
                    &control,
                    "-o",
                    "BatchMode=yes",
                    &self.destination,
                    "--",
                    command,
                ],
                self.command_timeout,
            )
            .await
            .context("ssh exec")
    }

    async fn mkdir(&self, path: &str) -> Result<Output> {
        self.exec(&mkdir_command(path)).await
    }

    async fn upload(&self, local: &Path, remote: &str) -> Result<Output> {
        let mut args = base_options(&self.scratch, &self.key, self.connect_timeout);
        // SFTP transfer mode takes the remote path literally.
        args.extend([
            "-s".to_string(),
            "-q".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control.display()),
            local.display().to_string(),
            format!("{}:{remote}", self.destination),
        ]);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner
            .run_with_timeout("scp", &argv, self.command_timeout)
            .await
            .context("scp")
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let args = self.exit_args();
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_timeout("ssh", &argv, CLOSE_TIMEOUT)
            .await
            .context("ssh -O exit")?;
        tracing::debug!(code = ?output.status.code(), "ssh master closed");
        Ok(())
    }
}

impl<R: CommandRunner> Drop for OpenSshSession<R> {
    fn drop(&mut self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let Some(dir) = self.dir.take() else {
            return;
        };
        // Best effort: the master would otherwise outlive the run. The socket
        // directory is kept until `-O exit` has finished with it.
        let args = self.exit_args();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let mut cmd = tokio::process::Command::new("ssh");
                cmd.args(&args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
                handle.spawn(async move {
                    if let Err(e) = cmd.status().await {
                        tracing::debug!(error = %e, "ssh -O exit on drop failed");
                    }
                    drop(dir);
                });
            }
            Err(_) => {
                let _ = std::process::Command::new("ssh")
                    .args(&args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();
            }
        }
    }
}
