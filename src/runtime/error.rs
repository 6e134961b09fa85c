use std::fmt;

/// Structured error type for container runtime invocations.
///
/// Every `podman` subprocess the adapter issues maps its failure into one of
/// these variants so the lifecycle controller can decide whether the failure
/// is fatal (extract, launch, init, signal) or best-effort (kill by name).
#[derive(Debug)]
pub enum RuntimeError {
    /// Runtime binary couldn't be executed (not in PATH, permission denied).
    ExecFailed {
        command: String,
        source: std::io::Error,
    },

    /// Runtime command ran but returned non-zero exit.
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
    },

    /// The tracked process has already exited; there is nothing to signal.
    ProcessExited { pid: Option<u32>, status: String },

    /// The OS refused to deliver a signal to the tracked process.
    SignalFailed { pid: u32, reason: String },
}

impl RuntimeError {
    /// Create an exec-failed error (binary not found / permission denied).
    pub fn exec_failed(cmd: impl Into<String>, err: std::io::Error) -> Self {
        RuntimeError::ExecFailed {
            command: cmd.into(),
            source: err,
        }
    }

    /// Create a command-failed error from the exit status of a finished child.
    pub fn failed(cmd: impl Into<String>, status: &std::process::ExitStatus) -> Self {
        RuntimeError::CommandFailed {
            command: cmd.into(),
            exit_code: status.code(),
        }
    }

    pub fn signal_failed(pid: u32, reason: impl Into<String>) -> Self {
        RuntimeError::SignalFailed {
            pid,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::ExecFailed { command, source } => {
                write!(f, "Failed to execute '{}': {}", command, source)
            }
            RuntimeError::CommandFailed { command, exit_code } => {
                if let Some(code) = exit_code {
                    write!(f, "'{}' failed (exit code {})", command, code)
                } else {
                    write!(f, "'{}' was terminated by a signal", command)
                }
            }
            RuntimeError::ProcessExited { pid, status } => match pid {
                Some(pid) => write!(f, "Process {} already finished ({})", pid, status),
                None => write!(f, "Process already finished ({})", status),
            },
            RuntimeError::SignalFailed { pid, reason } => {
                write!(f, "Failed to signal process {}: {}", pid, reason)
            }
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::ExecFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
