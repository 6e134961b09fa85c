use super::{HealthProbe, READY_STATUS};
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Polls a [`HealthProbe`] on a fixed interval until it reports [`READY_STATUS`].
///
/// There is no retry cap and no backoff: a slow first boot (database
/// initialisation) must never be given up on prematurely. Callers bound the
/// wait with an optional deadline or by cancelling the token.
#[derive(Debug, Clone)]
pub struct ReadinessWaiter {
    interval: Duration,
    timeout: Option<Duration>,
}

impl ReadinessWaiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }

    /// Bound every wait by `timeout`; `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Block until a probe returns exactly [`READY_STATUS`].
    ///
    /// Every probe is preceded by one interval of sleep. Non-ready statuses
    /// and probe errors are logged and polling continues. Returns the number
    /// of probes issued.
    ///
    /// # Errors
    ///
    /// [`Error::WaitCancelled`] if `cancel` fires, [`Error::WaitTimeout`] if
    /// the configured deadline passes first.
    pub async fn wait_until_up<P: HealthProbe + ?Sized>(
        &self,
        probe: &P,
        cancel: &CancellationToken,
    ) -> Result<u32> {
        let poll = self.poll_until_up(probe);
        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, poll)
                    .await
                    .map_err(|_| Error::WaitTimeout(limit)),
                None => Ok(poll.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::WaitCancelled),
            result = bounded => result,
        }
    }

    async fn poll_until_up<P: HealthProbe + ?Sized>(&self, probe: &P) -> u32 {
        let mut attempts = 0u32;
        loop {
            sleep(self.interval).await;
            attempts = attempts.saturating_add(1);

            match probe.probe().await {
                Ok(status) if status == READY_STATUS => {
                    tracing::info!(attempts, "Keycloak is up");
                    return attempts;
                }
                Ok(status) => tracing::info!(attempt = attempts, "Keycloak is not up: {}", status),
                Err(e) => tracing::info!(attempt = attempts, "Keycloak is not up: {}", e),
            }
        }
    }
}
