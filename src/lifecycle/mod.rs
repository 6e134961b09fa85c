//! Install-or-resume lifecycle of the Keycloak container.
//!
//! [`LifecycleController`] is the only component with state: it owns the
//! handle of the running container and decides, from the version marker on
//! disk, whether a start must run the full install ritual or a plain resume.
//!
//! ```text
//! UNINSTALLED --install--> Healthy
//! INSTALLED   --resume---> Running   (Healthy if resume_waits_for_ready)
//! Running|Healthy --stop--> Stopped
//! ```

mod controller;
mod settle;

pub use controller::*;
pub use settle::*;

use crate::runtime::RuntimeError;
use std::fmt;

/// Runtime phase of the supervised container, as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    /// Install ritual in progress.
    Installing,
    /// Resume ritual in progress.
    Starting,
    /// Container launched; readiness not verified.
    Running,
    /// Container launched and answered `UP`.
    Healthy,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Stopped => write!(f, "stopped"),
            ServiceState::Installing => write!(f, "installing"),
            ServiceState::Starting => write!(f, "starting"),
            ServiceState::Running => write!(f, "running"),
            ServiceState::Healthy => write!(f, "healthy"),
        }
    }
}

/// Which ritual a start took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPath {
    Install,
    Resume,
}

/// Result of a successful [`LifecycleController::start_service`].
#[derive(Debug)]
pub struct StartOutcome {
    pub path: StartPath,
    /// Whether the service answered `UP` before the call returned.
    pub ready: bool,
    /// Probes issued across all readiness waits of this start.
    pub probes: u32,
    /// Failure of the best-effort kill of a stale container, if any.
    pub stale_kill_error: Option<RuntimeError>,
}

/// Result of a successful [`LifecycleController::stop_service`].
#[derive(Debug)]
pub struct StopOutcome {
    /// PID of the process that received the terminate signal.
    pub pid: Option<u32>,
    /// Failure of the backstop kill by name, if any. Never fatal.
    pub kill_error: Option<RuntimeError>,
}
