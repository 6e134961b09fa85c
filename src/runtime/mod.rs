//! Container runtime adapter.
//!
//! The lifecycle controller talks to the container engine only through
//! [`ContainerRuntime`], so the install and resume rituals can be driven
//! against a real `podman` ([`PodmanRuntime`]) or a recording fake in tests.

pub mod client;
pub mod error;

pub use client::PodmanRuntime;
pub use error::RuntimeError;

use async_trait::async_trait;
use std::fmt::Debug;

/// A live container process started by [`ContainerRuntime::run`].
pub trait ContainerHandle: Send + Debug {
    /// OS process id, if the process has not been reaped yet.
    fn pid(&self) -> Option<u32>;

    /// Ask the process to exit with the platform's terminate signal.
    ///
    /// Fails if the process has already exited or cannot be signalled.
    fn terminate(&mut self) -> Result<(), RuntimeError>;
}

/// Operations the supervisor issues against the container engine for its
/// single named container.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// The fixed name every invocation addresses.
    fn container_name(&self) -> &str;

    /// Run the image in "extract" mode to materialise default state into the
    /// state volume. Blocks until the container exits.
    async fn extract_bootstrap(&self) -> Result<(), RuntimeError>;

    /// Start the container in serving mode without waiting for it to exit.
    async fn run(&self) -> Result<Box<dyn ContainerHandle>, RuntimeError>;

    /// Run `command` inside the running container. Blocks until it exits.
    async fn exec(&self, command: &[String]) -> Result<(), RuntimeError>;

    /// Kill the container by name. Callers treat failure as best-effort.
    async fn kill_by_name(&self) -> Result<(), RuntimeError>;

    /// Whether a container with the fixed name currently exists.
    async fn container_exists(&self) -> Result<bool, RuntimeError>;
}
