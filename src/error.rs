// Allow unused_assignments at module level because thiserror's generated code
// for struct variants triggers false positive warnings - the fields ARE used
// in the Display impl but rustc's lint pass doesn't see this.
#![allow(unused_assignments)]

use crate::healthcheck::ProbeError;
use crate::runtime::RuntimeError;
use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(idp::config::error))]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Filesystem error at '{}': {source}", .path.display())]
    #[diagnostic(
        code(idp::filesystem::error),
        help("The working directory must exist and be writable by the supervisor")
    )]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to extract Keycloak: {0}")]
    #[diagnostic(
        code(idp::install::extract),
        help("Check that the image exists and the runtime can mount the state directory")
    )]
    Extract(#[source] RuntimeError),

    #[error("Failed to start Keycloak: {0}")]
    #[diagnostic(
        code(idp::runtime::launch),
        help("Check that the container runtime binary is installed and on PATH")
    )]
    Launch(#[source] RuntimeError),

    #[error("Failed to initialize Keycloak: {0}")]
    #[diagnostic(code(idp::install::init))]
    Init(#[source] RuntimeError),

    #[error("Failed to stop Keycloak: {0}")]
    #[diagnostic(
        code(idp::runtime::signal),
        help("The tracked container process may have exited on its own")
    )]
    SignalFailed(#[source] RuntimeError),

    #[error("Keycloak is not running under this supervisor")]
    NotRunning,

    #[error("Readiness probe failed: {0}")]
    #[diagnostic(
        code(idp::health::probe),
        help("Keycloak answers only after its container is up; try again or run `wait`")
    )]
    Probe(#[from] ProbeError),

    #[error("Timed out after {} seconds waiting for Keycloak to become ready", .0.as_secs())]
    #[diagnostic(
        code(idp::health::timeout),
        help("Keycloak may still be initializing its database; increase health.wait_timeout")
    )]
    WaitTimeout(Duration),

    #[error("Cancelled while waiting for Keycloak to become ready")]
    WaitCancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a filesystem error for `path`.
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure leaves the service in a state with no automatic
    /// recovery.
    ///
    /// Probe errors are expected while the service boots and are only surfaced
    /// when a caller probes directly; a cancelled wait is a caller decision.
    /// Everything else returned by a lifecycle entry point is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Probe(_) | Error::WaitCancelled)
    }

    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::Filesystem { path, .. } => Some(format!(
                "Check permissions on '{}' or point --workdir at a writable directory.",
                path.display()
            )),
            Error::Extract(_) | Error::Init(_) => Some(
                "Inspect the container output above. Removing the state directory forces a fresh install on the next start."
                    .to_string(),
            ),
            Error::Launch(RuntimeError::ExecFailed { command, .. }) => Some(format!(
                "Could not run '{}'. Is the container runtime installed?",
                command
            )),
            Error::SignalFailed(_) => Some(
                "Run `podman ps` to see whether the container is still running.".to_string(),
            ),
            Error::WaitTimeout(_) => Some(
                "Check the container logs with `podman logs keycloak`.".to_string(),
            ),
            Error::Probe(ProbeError::Transport(_)) => Some(
                "Nothing answered on the health endpoint. Is the container running?".to_string(),
            ),
            Error::Config(_) | Error::Yaml(_) => {
                Some("Validate idp-supervisor.yaml against the documented keys.".to_string())
            }
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }
}
