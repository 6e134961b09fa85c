//! Ownership of the long-lived `podman run` child process.
//!
//! The container runtime launches the serving container in the foreground of
//! a child process; terminating that child is how the supervisor asks the
//! container to shut down gracefully. [`ContainerProcess`] is the only place
//! that holds the OS handle.

use crate::runtime::{ContainerHandle, RuntimeError};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::ExitStatus;
use tokio::process::Child;

/// Handle to the child process running `podman run` for the serving container.
#[derive(Debug)]
pub struct ContainerProcess {
    child: Child,
    command: String,
}

impl ContainerProcess {
    pub fn new(child: Child, command: impl Into<String>) -> Self {
        Self {
            child,
            command: command.into(),
        }
    }

    /// Wait for the child to exit and reap it.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }
}

impl ContainerHandle for ContainerProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn terminate(&mut self) -> Result<(), RuntimeError> {
        // A reaped child has no PID left to signal; report it like a stale handle.
        match self.child.try_wait() {
            Ok(Some(status)) => {
                return Err(RuntimeError::ProcessExited {
                    pid: None,
                    status: status.to_string(),
                });
            }
            Ok(None) => {}
            Err(e) => {
                return Err(RuntimeError::signal_failed(
                    self.child.id().unwrap_or(0),
                    format!("failed to poll process state: {}", e),
                ));
            }
        }

        let pid = self.child.id().ok_or_else(|| RuntimeError::ProcessExited {
            pid: None,
            status: "no pid".to_string(),
        })?;
        let raw = validate_pid(pid)?;

        tracing::debug!("Sending SIGTERM to {} (pid {})", self.command, pid);
        signal::kill(raw, Signal::SIGTERM).map_err(|e| RuntimeError::signal_failed(pid, e.to_string()))
    }
}

/// Converts a u32 PID to `nix::unistd::Pid`, refusing values that would
/// address a process group or init.
pub fn validate_pid(pid: u32) -> Result<Pid, RuntimeError> {
    if pid == 0 {
        return Err(RuntimeError::signal_failed(
            pid,
            "PID 0 refers to the process group, not a process",
        ));
    }
    if pid == 1 {
        return Err(RuntimeError::signal_failed(pid, "refusing to signal PID 1 (init)"));
    }
    if pid > i32::MAX as u32 {
        return Err(RuntimeError::signal_failed(
            pid,
            "PID exceeds i32::MAX, cannot convert safely",
        ));
    }
    Ok(Pid::from_raw(pid as i32))
}
