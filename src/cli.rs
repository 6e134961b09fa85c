use clap::{Parser, Subcommand};
use idp_supervisor::SupervisorConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idp-supervisor")]
#[command(about = "Install, start and health-gate the Keycloak identity provider container")]
pub struct Cli {
    /// Config file path (defaults to idp-supervisor.yaml, searched upward)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Working directory holding keycloak/ and certs/
    #[arg(short, long)]
    pub workdir: Option<PathBuf>,

    /// Keycloak container image
    #[arg(long)]
    pub image: Option<String>,

    /// Externally reachable hostname of the identity provider
    #[arg(long)]
    pub hostname: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start Keycloak (installing it on first use) and stop it on SIGINT/SIGTERM
    Run {
        /// Also wait for readiness when resuming an existing installation
        #[arg(long)]
        wait_on_resume: bool,

        /// Give up on each readiness wait after this long (e.g. "10m")
        #[arg(long, value_name = "DURATION")]
        timeout: Option<String>,
    },
    /// Show install state and probe the health endpoint once
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Block until the health endpoint reports UP
    Wait {
        /// Give up after this long (e.g. "2m")
        #[arg(long, value_name = "DURATION")]
        timeout: Option<String>,
    },
}

impl Cli {
    /// Apply command-line flags on top of the loaded config file.
    pub fn apply_overrides(&self, config: &mut SupervisorConfig) {
        if let Some(workdir) = &self.workdir {
            config.workdir = Some(workdir.clone());
        }
        if let Some(image) = &self.image {
            config.container.image = image.clone();
        }
        if let Some(hostname) = &self.hostname {
            config.container.hostname = hostname.clone();
        }
    }
}
