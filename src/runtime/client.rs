//! Container runtime CLI client.
//!
//! All `podman` invocations go through [`PodmanRuntime`], which owns the fixed
//! argument templates for the Keycloak container and maps failures to
//! [`RuntimeError`]. Child stdout/stderr are inherited so the container's own
//! output shows up in the supervisor's log stream.

use super::{ContainerHandle, ContainerRuntime, RuntimeError};
use crate::config::ContainerConfig;
use crate::markers::MarkerStore;
use crate::process::ContainerProcess;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Runtime adapter for a single named, replaceable container.
#[derive(Debug, Clone)]
pub struct PodmanRuntime {
    container: ContainerConfig,
    state_dir: PathBuf,
    certs_dir: PathBuf,
}

impl PodmanRuntime {
    pub fn new(container: ContainerConfig, markers: &MarkerStore) -> Self {
        Self {
            container,
            state_dir: markers.state_dir().to_path_buf(),
            certs_dir: markers.certs_dir().to_path_buf(),
        }
    }

    // ========================================================================
    // Argument templates
    // ========================================================================

    /// Flags shared by every `run`: auto-remove, fixed name with `--replace`,
    /// and the user namespace mapping.
    fn base_run_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            self.container.name.clone(),
            "--replace".to_string(),
        ];
        if let Some(userns) = &self.container.userns {
            args.push(format!("--userns={}", userns));
        }
        args
    }

    fn volume(host: &Path, guest: &str) -> String {
        format!("{}:{}", host.display(), guest)
    }

    pub(crate) fn extract_args(&self) -> Vec<String> {
        let mut args = self.base_run_args();
        args.push("-v".to_string());
        args.push(Self::volume(&self.state_dir, &self.container.state_mount));
        args.push(self.container.image.clone());
        args.extend(self.container.extract_command.iter().cloned());
        args
    }

    pub(crate) fn serve_args(&self) -> Vec<String> {
        let port = self.container.port;
        let hostname = &self.container.hostname;

        let mut args = self.base_run_args();
        args.extend([
            "-v".to_string(),
            Self::volume(&self.certs_dir, &self.container.certs_mount),
            "-v".to_string(),
            Self::volume(&self.state_dir, &self.container.state_mount),
            "-p".to_string(),
            format!("{}:{}/tcp", port, port),
            "--add-host".to_string(),
            format!("{}:127.0.0.1", hostname),
            self.container.image.clone(),
        ]);
        args.extend(self.container.run_command.iter().cloned());
        args.push("--hostname".to_string());
        args.push(hostname.clone());
        args
    }

    pub(crate) fn exec_args(&self, command: &[String]) -> Vec<String> {
        let mut args = vec!["exec".to_string(), self.container.name.clone()];
        args.extend(command.iter().cloned());
        args
    }

    pub(crate) fn kill_args(&self) -> Vec<String> {
        vec!["kill".to_string(), self.container.name.clone()]
    }

    pub(crate) fn exists_args(&self) -> Vec<String> {
        vec![
            "container".to_string(),
            "exists".to_string(),
            self.container.name.clone(),
        ]
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn command_string(&self, args: &[String]) -> String {
        format!("{} {}", self.container.runtime, args.join(" "))
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.container.runtime);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }

    /// Run a runtime command to completion, succeeding only on exit 0.
    async fn run_blocking(&self, args: &[String]) -> Result<(), RuntimeError> {
        let cmd_str = self.command_string(args);
        tracing::debug!("Running {}", cmd_str);

        let status = self
            .command(args)
            .status()
            .await
            .map_err(|e| RuntimeError::exec_failed(&cmd_str, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(RuntimeError::failed(cmd_str, &status))
        }
    }
}

#[async_trait]
impl ContainerRuntime for PodmanRuntime {
    fn container_name(&self) -> &str {
        &self.container.name
    }

    async fn extract_bootstrap(&self) -> Result<(), RuntimeError> {
        self.run_blocking(&self.extract_args()).await
    }

    async fn run(&self) -> Result<Box<dyn ContainerHandle>, RuntimeError> {
        let args = self.serve_args();
        let cmd_str = self.command_string(&args);
        tracing::debug!("Launching {}", cmd_str);

        let child = self
            .command(&args)
            .spawn()
            .map_err(|e| RuntimeError::exec_failed(&cmd_str, e))?;

        Ok(Box::new(ContainerProcess::new(child, cmd_str)))
    }

    async fn exec(&self, command: &[String]) -> Result<(), RuntimeError> {
        self.run_blocking(&self.exec_args(command)).await
    }

    async fn kill_by_name(&self) -> Result<(), RuntimeError> {
        self.run_blocking(&self.kill_args()).await
    }

    async fn container_exists(&self) -> Result<bool, RuntimeError> {
        let args = self.exists_args();
        let cmd_str = self.command_string(&args);
        let status = Command::new(&self.container.runtime)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| RuntimeError::exec_failed(&cmd_str, e))?;

        // `container exists` exits 1 for a missing container, anything else is an error
        match status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(RuntimeError::failed(cmd_str, &status)),
        }
    }
}
