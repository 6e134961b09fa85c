use super::SupervisorConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "idp-supervisor.yaml";
const ALT_CONFIG_FILE_NAME: &str = "idp-supervisor.yml";

pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Find config file starting from current directory, falling back to the
    /// user config directory (`~/.config/idp-supervisor/`).
    pub fn find_config_file(&self) -> Option<PathBuf> {
        let from_cwd = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_config_in_dir(&dir));
        from_cwd.or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join("idp-supervisor").join(CONFIG_FILE_NAME))
                .filter(|path| path.is_file())
        })
    }

    /// Search `dir` and its ancestors for a config file.
    pub fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
        for candidate in dir.ancestors() {
            for name in [CONFIG_FILE_NAME, ALT_CONFIG_FILE_NAME] {
                let path = candidate.join(name);
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Load config from file path
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<SupervisorConfig> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config = self.parse_config(&content)?;
        tracing::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate config from a YAML string.
    ///
    /// An empty document yields the default configuration.
    pub fn parse_config(&self, content: &str) -> Result<SupervisorConfig> {
        let config: SupervisorConfig = if content.trim().is_empty() {
            SupervisorConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettleConfig;
    use std::time::Duration;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
workdir: /srv/box
container:
  image: registry.example/keycloak:24
  hostname: auth.example.test
  port: 8443
  userns: null
health:
  interval: 250ms
  wait_timeout: 5m
lifecycle:
  resume_waits_for_ready: true
  settle:
    strategy: poll_gone
    interval: 100ms
    timeout: 10s
"#;

        let config = Parser::new().parse_config(yaml).unwrap();

        assert_eq!(config.workdir(), PathBuf::from("/srv/box"));
        assert_eq!(config.container.image, "registry.example/keycloak:24");
        assert_eq!(config.container.hostname, "auth.example.test");
        assert_eq!(config.container.port, 8443);
        assert_eq!(config.container.userns, None);
        // Unset container fields keep their defaults
        assert_eq!(config.container.name, "keycloak");
        assert_eq!(
            config.health.endpoint_for(config.container.port),
            "https://127.0.0.1:8443/health/ready"
        );
        assert_eq!(config.health.get_interval().unwrap(), Duration::from_millis(250));
        assert_eq!(
            config.health.get_wait_timeout().unwrap(),
            Some(Duration::from_secs(300))
        );
        assert!(config.lifecycle.resume_waits_for_ready);
        assert_eq!(
            config.lifecycle.settle,
            SettleConfig::PollGone {
                interval: Some("100ms".to_string()),
                timeout: Some("10s".to_string()),
            }
        );
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = Parser::new().parse_config("  \n").unwrap();
        assert_eq!(config.container.image, crate::config::DEFAULT_IMAGE);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = Parser::new().parse_config("containr:\n  image: x\n");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let result = Parser::new().parse_config("health:\n  interval: quickly\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = Parser::find_config_in_dir(&nested).expect("config should be found");
        assert_eq!(found, temp.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let temp = tempfile::tempdir().unwrap();
        let result = Parser::new().load_config(temp.path().join("missing.yaml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
