use super::{parse_duration_field, DEFAULT_READY_INTERVAL};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_IMAGE: &str = "naive.systems/box/keycloak:dev";
pub const DEFAULT_CONTAINER_NAME: &str = "keycloak";
pub const DEFAULT_RUNTIME: &str = "podman";
pub const DEFAULT_HEALTH_PORT: u16 = 9992;

/// Top-level supervisor configuration, loaded from `idp-supervisor.yaml`.
///
/// Every section is optional; an empty file reproduces the stock Keycloak
/// deployment on port 9992.
///
/// ```yaml
/// workdir: /var/lib/box
/// container:
///   image: naive.systems/box/keycloak:dev
///   hostname: auth.example.test
/// health:
///   interval: 1s
///   wait_timeout: 10m
/// lifecycle:
///   resume_waits_for_ready: true
///   settle:
///     strategy: poll_gone
///     interval: 200ms
///     timeout: 10s
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Working directory root holding `keycloak/` and `certs/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
    pub container: ContainerConfig,
    pub health: HealthConfig,
    pub lifecycle: LifecycleConfig,
}

impl SupervisorConfig {
    /// The configured working directory, or the current directory.
    pub fn workdir(&self) -> PathBuf {
        self.workdir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Check every field that can only be validated after parsing.
    pub fn validate(&self) -> Result<()> {
        if self.container.name.trim().is_empty() {
            return Err(Error::Config("container.name cannot be empty".to_string()));
        }
        if self.container.image.trim().is_empty() {
            return Err(Error::Config("container.image cannot be empty".to_string()));
        }
        if self.container.hostname.trim().is_empty() {
            return Err(Error::Config("container.hostname cannot be empty".to_string()));
        }
        if self.container.port == 0 {
            return Err(Error::Config("container.port must be non-zero".to_string()));
        }
        for (field, cmd) in [
            ("container.extract_command", &self.container.extract_command),
            ("container.run_command", &self.container.run_command),
            ("container.init_command", &self.container.init_command),
        ] {
            if cmd.is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", field)));
            }
        }

        let interval = self.health.get_interval()?;
        if interval.is_zero() {
            return Err(Error::Config("health.interval must be greater than zero".to_string()));
        }
        self.health.get_probe_timeout()?;
        self.health.get_wait_timeout()?;
        self.lifecycle.settle.validate()?;

        Ok(())
    }
}

/// How the container runtime is invoked for the Keycloak container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// Container runtime executable.
    pub runtime: String,
    /// Fixed container name; every run uses `--replace` on it.
    pub name: String,
    pub image: String,
    /// Externally reachable hostname, mapped to loopback inside the container.
    pub hostname: String,
    /// Published TCP port, also used by the readiness probe.
    pub port: u16,
    /// `--userns` value; omitted from the command line when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userns: Option<String>,
    /// Mount point of the state directory inside the container.
    pub state_mount: String,
    /// Mount point of the certificates directory inside the container.
    pub certs_mount: String,
    pub extract_command: Vec<String>,
    pub run_command: Vec<String>,
    pub init_command: Vec<String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            name: DEFAULT_CONTAINER_NAME.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            hostname: "localhost".to_string(),
            port: DEFAULT_HEALTH_PORT,
            userns: Some("keep-id:uid=1000,gid=1000".to_string()),
            state_mount: "/home/keycloak/keycloak".to_string(),
            certs_mount: "/certs".to_string(),
            extract_command: vec!["/home/keycloak/extract".to_string()],
            run_command: vec!["/home/keycloak/run".to_string()],
            init_command: vec!["/home/keycloak/init".to_string()],
        }
    }
}

/// Readiness probing and waiting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    /// Override for the probe URL; defaults to
    /// `https://127.0.0.1:<container.port>/health/ready`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Fixed delay before every probe (e.g. "1s").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// Per-request timeout. Unset means the transport default: a hung
    /// endpoint hangs the probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_timeout: Option<String>,
    /// Overall deadline for one readiness wait. Unset means wait forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_timeout: Option<String>,
}

impl HealthConfig {
    /// The probe URL for a container publishing `port`.
    pub fn endpoint_for(&self, port: u16) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://127.0.0.1:{}/health/ready", port))
    }

    pub fn get_interval(&self) -> Result<Duration> {
        Ok(parse_duration_field("health.interval", self.interval.as_deref())?
            .unwrap_or(DEFAULT_READY_INTERVAL))
    }

    pub fn get_probe_timeout(&self) -> Result<Option<Duration>> {
        parse_duration_field("health.probe_timeout", self.probe_timeout.as_deref())
    }

    pub fn get_wait_timeout(&self) -> Result<Option<Duration>> {
        parse_duration_field("health.wait_timeout", self.wait_timeout.as_deref())
    }
}

/// Install/resume behaviour of the lifecycle controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Block the resume path until the service reports ready, like the
    /// install path does. Off by default: resume returns once the container
    /// has been launched.
    pub resume_waits_for_ready: bool,
    pub settle: SettleConfig,
}

/// Pause between stopping the first-boot container and starting it again.
///
/// ```yaml
/// settle:
///   strategy: fixed
///   delay: 1s
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SettleConfig {
    /// Sleep for a flat delay (default 1s).
    Fixed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay: Option<String>,
    },
    /// Poll the runtime until the named container no longer exists.
    PollGone {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<String>,
    },
}

impl Default for SettleConfig {
    fn default() -> Self {
        SettleConfig::Fixed { delay: None }
    }
}

impl SettleConfig {
    fn validate(&self) -> Result<()> {
        match self {
            SettleConfig::Fixed { delay } => {
                parse_duration_field("lifecycle.settle.delay", delay.as_deref())?;
            }
            SettleConfig::PollGone { interval, timeout } => {
                let interval =
                    parse_duration_field("lifecycle.settle.interval", interval.as_deref())?;
                if interval.is_some_and(|i| i.is_zero()) {
                    return Err(Error::Config(
                        "lifecycle.settle.interval must be greater than zero".to_string(),
                    ));
                }
                parse_duration_field("lifecycle.settle.timeout", timeout.as_deref())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_deployment() {
        let config = SupervisorConfig::default();
        assert_eq!(config.container.runtime, "podman");
        assert_eq!(config.container.name, "keycloak");
        assert_eq!(config.container.port, 9992);
        assert_eq!(
            config.health.endpoint_for(config.container.port),
            "https://127.0.0.1:9992/health/ready"
        );
        assert_eq!(config.health.get_interval().unwrap(), Duration::from_secs(1));
        assert_eq!(config.health.get_wait_timeout().unwrap(), None);
        assert_eq!(config.health.get_probe_timeout().unwrap(), None);
        assert!(!config.lifecycle.resume_waits_for_ready);
        assert_eq!(config.lifecycle.settle, SettleConfig::Fixed { delay: None });
        assert_eq!(config.workdir(), PathBuf::from("."));
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = SupervisorConfig::default();
        config.health.interval = Some("0s".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_init_command() {
        let mut config = SupervisorConfig::default();
        config.container.init_command.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("container.init_command"));
    }

    #[test]
    fn test_validate_rejects_bad_settle_duration() {
        let mut config = SupervisorConfig::default();
        config.lifecycle.settle = SettleConfig::PollGone {
            interval: Some("fast".to_string()),
            timeout: None,
        };
        assert!(config.validate().is_err());
    }
}
