use async_trait::async_trait;
use thiserror::Error;

/// Status value reported by a fully initialised service.
pub const READY_STATUS: &str = "UP";

/// Single-shot readiness check against the service.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Fetch the current status string. Never cached.
    async fn probe(&self) -> Result<String, ProbeError>;
}

/// Why a probe produced no status.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid health endpoint: {0}")]
    InvalidUrl(String),

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    #[error("malformed health response: {0}")]
    Parse(#[from] serde_json::Error),
}
