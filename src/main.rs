mod cli;

use clap::Parser as _;
use cli::{Cli, Commands};
use idp_supervisor::{Error as SupervisorError, LifecycleController, Parser, SupervisorConfig};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(err) = e.downcast_ref::<SupervisorError>() {
            eprintln!("Error: {}", err);
            if let Some(suggestion) = err.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let parser = Parser::new();
    let mut config = match cli.config.clone().or_else(|| parser.find_config_file()) {
        Some(path) => parser.load_config(path)?,
        None => SupervisorConfig::default(),
    };
    cli.apply_overrides(&mut config);

    match cli.command {
        Commands::Run {
            wait_on_resume,
            timeout,
        } => {
            if wait_on_resume {
                config.lifecycle.resume_waits_for_ready = true;
            }
            if timeout.is_some() {
                config.health.wait_timeout = timeout;
            }
            run_service(&config).await
        }
        Commands::Status { json } => show_status(&config, json).await,
        Commands::Wait { timeout } => {
            if timeout.is_some() {
                config.health.wait_timeout = timeout;
            }
            wait_ready(&config).await
        }
    }
}

/// Start Keycloak, keep it running until a shutdown signal, then stop it.
async fn run_service(config: &SupervisorConfig) -> anyhow::Result<()> {
    let controller = LifecycleController::from_config(config)?;
    let shutdown = controller.cancellation_token();
    cancel_on_shutdown_signal(shutdown.clone());

    match controller.start_service().await {
        Ok(outcome) => {
            tracing::info!(
                "Keycloak started via {:?} path ({})",
                outcome.path,
                controller.state()
            );
        }
        Err(SupervisorError::WaitCancelled) => {
            tracing::info!("Shutdown requested during startup");
        }
        Err(e) => {
            if controller.state() != idp_supervisor::ServiceState::Stopped {
                if let Err(stop_err) = controller.stop_service().await {
                    tracing::warn!("Cleanup after failed start: {}", stop_err);
                }
            }
            return Err(e.into());
        }
    }

    shutdown.cancelled().await;
    tracing::info!("Stopping Keycloak");

    match controller.stop_service().await {
        Ok(outcome) => {
            if let Some(e) = outcome.kill_error {
                tracing::debug!("Backstop kill reported: {}", e);
            }
            Ok(())
        }
        Err(SupervisorError::NotRunning) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Serialize)]
struct StatusReport {
    workdir: String,
    installed: bool,
    endpoint: String,
    status: Option<String>,
    error: Option<String>,
}

async fn show_status(config: &SupervisorConfig, json: bool) -> anyhow::Result<()> {
    let controller = LifecycleController::from_config(config)?;

    let (status, error) = match controller.check_health().await {
        Ok(status) => (Some(status), None),
        Err(e) if !e.is_fatal() => (None, Some(e.to_string())),
        Err(e) => return Err(e.into()),
    };
    let report = StatusReport {
        workdir: config.workdir().display().to_string(),
        installed: controller.markers().is_installed()?,
        endpoint: config.health.endpoint_for(config.container.port),
        status,
        error,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Working directory: {}", report.workdir);
        println!("Installed:         {}", if report.installed { "yes" } else { "no" });
        println!("Endpoint:          {}", report.endpoint);
        match (&report.status, &report.error) {
            (Some(status), _) => println!("Status:            {}", status),
            (None, Some(error)) => println!("Status:            unreachable ({})", error),
            (None, None) => println!("Status:            unknown"),
        }
    }
    Ok(())
}

async fn wait_ready(config: &SupervisorConfig) -> anyhow::Result<()> {
    let controller = LifecycleController::from_config(config)?;
    cancel_on_shutdown_signal(controller.cancellation_token());

    let probes = controller.wait_until_up().await?;
    tracing::debug!("Ready after {} probes", probes);
    Ok(())
}

/// Cancel `token` on the first SIGINT or SIGTERM.
fn cancel_on_shutdown_signal(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = term.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    let _ = ctrl_c.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }

        token.cancel();
    });
}

fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
