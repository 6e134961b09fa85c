//! # idp-supervisor
//!
//! Supervises the containerized Keycloak identity provider a host
//! application depends on.
//!
//! ## Features
//!
//! - **Install or resume**: a version marker in the state directory decides
//!   between the one-time install ritual and a plain restart
//! - **Health gating**: starts block until `/health/ready` reports `UP`
//! - **Cancellation Support**: readiness waits accept a `CancellationToken`
//!   and an optional deadline, unbounded by default
//! - **Typed failures**: fatal and best-effort failures are separate, so the
//!   host decides whether to abort
//!
//! ## Quick Start
//!
//! ```no_run
//! use idp_supervisor::{LifecycleController, Parser};
//!
//! # async fn example() -> Result<(), idp_supervisor::Error> {
//! let config = Parser::new().parse_config("workdir: /var/lib/box\n")?;
//! let controller = LifecycleController::from_config(&config)?;
//!
//! // Installs on first use, then blocks until Keycloak is healthy
//! controller.start_service().await?;
//!
//! // ... host application runs ...
//!
//! controller.stop_service().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod healthcheck;
pub mod lifecycle;
pub mod markers;
pub mod process;
pub mod runtime;

// Re-export commonly used types
pub use config::{Parser, SupervisorConfig};
pub use error::{Error, Result};
pub use lifecycle::{LifecycleController, ServiceState, StartOutcome, StartPath, StopOutcome};
pub use markers::MarkerStore;
