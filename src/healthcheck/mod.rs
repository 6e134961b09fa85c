//! Readiness probing for the Keycloak container.
//!
//! - [`HttpReadinessProbe`] performs one request against `/health/ready`
//! - [`ReadinessWaiter`] repeats a probe until it reports [`READY_STATUS`]

mod checker;
mod http;
mod waiter;

pub use checker::*;
pub use http::*;
pub use waiter::*;
