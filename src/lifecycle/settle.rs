use crate::config::{
    parse_duration_field, SettleConfig, DEFAULT_SETTLE_DELAY, DEFAULT_SETTLE_POLL_INTERVAL,
    DEFAULT_SETTLE_POLL_TIMEOUT,
};
use crate::error::Result;
use crate::runtime::ContainerRuntime;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// How the install ritual waits for the runtime to release the container
/// name and port between the first-boot stop and the second run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Flat pause.
    Fixed(Duration),
    /// Poll `container exists` until the container is gone, giving up (and
    /// proceeding anyway) after `timeout`.
    PollGone { interval: Duration, timeout: Duration },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        SettleStrategy::Fixed(DEFAULT_SETTLE_DELAY)
    }
}

impl SettleStrategy {
    pub fn from_config(config: &SettleConfig) -> Result<Self> {
        Ok(match config {
            SettleConfig::Fixed { delay } => SettleStrategy::Fixed(
                parse_duration_field("lifecycle.settle.delay", delay.as_deref())?
                    .unwrap_or(DEFAULT_SETTLE_DELAY),
            ),
            SettleConfig::PollGone { interval, timeout } => SettleStrategy::PollGone {
                interval: parse_duration_field("lifecycle.settle.interval", interval.as_deref())?
                    .unwrap_or(DEFAULT_SETTLE_POLL_INTERVAL),
                timeout: parse_duration_field("lifecycle.settle.timeout", timeout.as_deref())?
                    .unwrap_or(DEFAULT_SETTLE_POLL_TIMEOUT),
            },
        })
    }

    /// Wait according to the strategy. Never fails: a container that lingers
    /// past the poll timeout is reported and the ritual continues, since the
    /// next run uses `--replace` anyway.
    pub async fn settle(&self, runtime: &dyn ContainerRuntime) {
        match *self {
            SettleStrategy::Fixed(delay) => sleep(delay).await,
            SettleStrategy::PollGone { interval, timeout } => {
                let deadline = Instant::now() + timeout;
                loop {
                    match runtime.container_exists().await {
                        Ok(false) => return,
                        Ok(true) => {}
                        Err(e) => tracing::debug!("container exists check failed: {}", e),
                    }
                    if Instant::now() + interval > deadline {
                        tracing::warn!(
                            "Container '{}' still present after {:?}, continuing",
                            runtime.container_name(),
                            timeout
                        );
                        return;
                    }
                    sleep(interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_defaults() {
        assert_eq!(
            SettleStrategy::from_config(&SettleConfig::default()).unwrap(),
            SettleStrategy::Fixed(Duration::from_secs(1))
        );
        assert_eq!(
            SettleStrategy::from_config(&SettleConfig::PollGone {
                interval: None,
                timeout: Some("3s".to_string()),
            })
            .unwrap(),
            SettleStrategy::PollGone {
                interval: Duration::from_millis(200),
                timeout: Duration::from_secs(3),
            }
        );
    }

    #[test]
    fn test_from_config_rejects_bad_delay() {
        let config = SettleConfig::Fixed {
            delay: Some("a while".to_string()),
        };
        assert!(SettleStrategy::from_config(&config).is_err());
    }
}
