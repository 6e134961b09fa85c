use super::{HealthProbe, ProbeError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Body of Keycloak's `/health/ready` endpoint. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct HealthStatus {
    status: String,
}

/// Readiness probe against the container's published health endpoint.
///
/// The endpoint is loopback-only and serves a locally issued certificate, so
/// certificate verification is disabled for this client and nothing else.
#[derive(Debug, Clone)]
pub struct HttpReadinessProbe {
    url: String,
    client: Client,
}

impl HttpReadinessProbe {
    /// Create a probe for `url`.
    ///
    /// Without `timeout` no request deadline is set: a hung endpoint hangs the
    /// probe, and the caller's overall wait deadline (if any) applies.
    ///
    /// # Errors
    ///
    /// Returns error if URL is malformed or uses unsupported scheme.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ProbeError> {
        let url = url.into();
        Self::validate_url(&url)?;

        let mut builder = Client::builder().danger_accept_invalid_certs(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ProbeError::Client)?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Validate that a URL is well-formed and uses HTTP/HTTPS scheme.
    fn validate_url(url: &str) -> Result<(), ProbeError> {
        let parsed =
            url::Url::parse(url).map_err(|e| ProbeError::InvalidUrl(format!("'{}': {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ProbeError::InvalidUrl(format!(
                "'{}': scheme must be http or https, got '{}'",
                url, scheme
            ))),
        }
    }
}

/// Extract the `status` field from a health response body.
pub fn parse_status(body: &[u8]) -> Result<String, ProbeError> {
    let status: HealthStatus = serde_json::from_slice(body)?;
    Ok(status.status)
}

#[async_trait]
impl HealthProbe for HttpReadinessProbe {
    async fn probe(&self) -> Result<String, ProbeError> {
        // The HTTP status is not inspected: a booting Keycloak answers 503
        // with {"status": "DOWN"}, which is still a valid reading.
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(ProbeError::Transport)?;
        let body = response.bytes().await.map_err(ProbeError::Transport)?;
        parse_status(&body)
    }
}
