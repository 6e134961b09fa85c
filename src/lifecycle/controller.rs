use super::{ServiceState, SettleStrategy, StartOutcome, StartPath, StopOutcome};
use crate::config::SupervisorConfig;
use crate::error::{Error, Result};
use crate::healthcheck::{HealthProbe, HttpReadinessProbe, ReadinessWaiter, READY_STATUS};
use crate::markers::MarkerStore;
use crate::runtime::{ContainerHandle, ContainerRuntime, PodmanRuntime, RuntimeError};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

type HandleSlot = Option<Box<dyn ContainerHandle>>;

/// Supervises the single Keycloak container of one working directory.
///
/// # Concurrency
///
/// `start_service` and `stop_service` hold the handle mutex for their whole
/// duration, so concurrent calls are serialized rather than racing on the
/// tracked process. [`state`](Self::state) never blocks.
///
/// # Cancellation
///
/// [`start_service`](Self::start_service) observes the controller-wide
/// [`cancellation_token`](Self::cancellation_token), which is meant for
/// shutdown: once it fires, every later start returns
/// [`Error::WaitCancelled`] without touching the runtime. Use
/// [`start_service_with`](Self::start_service_with) to scope cancellation to
/// a single start. A start cancelled mid-ritual leaves any launched container
/// tracked so it can still be stopped.
pub struct LifecycleController {
    runtime: Arc<dyn ContainerRuntime>,
    probe: Arc<dyn HealthProbe>,
    markers: MarkerStore,
    waiter: ReadinessWaiter,
    settle: SettleStrategy,
    init_command: Vec<String>,
    resume_waits_for_ready: bool,
    cancel: CancellationToken,
    handle: Mutex<HandleSlot>,
    state: RwLock<ServiceState>,
}

impl LifecycleController {
    /// Build a controller driving `podman` and probing the configured
    /// health endpoint.
    pub fn from_config(config: &SupervisorConfig) -> Result<Self> {
        let markers = MarkerStore::for_workdir(&config.workdir());
        let runtime = Arc::new(PodmanRuntime::new(config.container.clone(), &markers));
        let probe = HttpReadinessProbe::new(
            config.health.endpoint_for(config.container.port),
            config.health.get_probe_timeout()?,
        )
        .map_err(|e| Error::Config(e.to_string()))?;
        tracing::debug!("Readiness endpoint: {}", probe.url());
        Self::with_components(config, runtime, Arc::new(probe))
    }

    /// Build a controller around explicit runtime and probe implementations.
    pub fn with_components(
        config: &SupervisorConfig,
        runtime: Arc<dyn ContainerRuntime>,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Self> {
        config.validate()?;

        let waiter = ReadinessWaiter::new(config.health.get_interval()?)
            .with_timeout(config.health.get_wait_timeout()?);

        Ok(Self {
            runtime,
            probe,
            markers: MarkerStore::for_workdir(&config.workdir()),
            waiter,
            settle: SettleStrategy::from_config(&config.lifecycle.settle)?,
            init_command: config.container.init_command.clone(),
            resume_waits_for_ready: config.lifecycle.resume_waits_for_ready,
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
            state: RwLock::new(ServiceState::Stopped),
        })
    }

    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    /// Token that aborts readiness waits of this controller.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn set_state(&self, state: ServiceState) {
        let mut current = self.state.write();
        if *current != state {
            tracing::debug!("Keycloak state: {} -> {}", *current, state);
            *current = state;
        }
    }

    /// Probe the health endpoint once and return the reported status.
    pub async fn check_health(&self) -> Result<String> {
        Ok(self.probe.probe().await?)
    }

    /// Block until the health endpoint reports ready.
    ///
    /// Useful after a resume that did not wait. Returns the number of probes.
    pub async fn wait_until_up(&self) -> Result<u32> {
        let probes = self.await_ready(&self.cancel).await?;
        if self.state() == ServiceState::Running {
            self.set_state(ServiceState::Healthy);
        }
        Ok(probes)
    }

    /// Bring the container up, installing it first if the version marker is
    /// absent.
    ///
    /// # Errors
    ///
    /// Every error is fatal for this start except [`Error::WaitCancelled`].
    /// A failed kill of a stale container is not an error; it is reported in
    /// [`StartOutcome::stale_kill_error`].
    pub async fn start_service(&self) -> Result<StartOutcome> {
        self.start_service_with(&self.cancel).await
    }

    /// Like [`start_service`](Self::start_service), but cancelled by `cancel`
    /// instead of the controller-wide token.
    ///
    /// `cancel` is checked before the runtime is touched and between ritual
    /// steps, so an already cancelled token neither kills, extracts nor
    /// launches anything.
    pub async fn start_service_with(&self, cancel: &CancellationToken) -> Result<StartOutcome> {
        let mut slot = self.handle.lock().await;
        Self::ensure_not_cancelled(cancel)?;

        self.markers.ensure_state_dir()?;
        if !self.markers.has_certs_dir() {
            tracing::warn!(
                "Certificates directory {} does not exist",
                self.markers.certs_dir().display()
            );
        }

        let stale_kill_error = self.kill_by_name().await;
        if let Some(previous) = slot.take() {
            tracing::debug!("Discarding previous container handle (pid {:?})", previous.pid());
        }

        let result = if self.markers.is_installed()? {
            self.resume(&mut slot, cancel).await
        } else {
            self.install(&mut slot, cancel).await
        };

        match result {
            Ok((path, ready, probes)) => Ok(StartOutcome {
                path,
                ready,
                probes,
                stale_kill_error,
            }),
            Err(e) => {
                self.set_state(if slot.is_some() {
                    ServiceState::Running
                } else {
                    ServiceState::Stopped
                });
                Err(e)
            }
        }
    }

    /// Stop the tracked container: terminate signal first, then kill by name
    /// as a backstop.
    ///
    /// # Errors
    ///
    /// [`Error::NotRunning`] without a tracked container, and
    /// [`Error::SignalFailed`] if the signal cannot be delivered. Both return
    /// before any kill by name is attempted.
    pub async fn stop_service(&self) -> Result<StopOutcome> {
        let mut slot = self.handle.lock().await;
        self.stop(&mut slot).await
    }

    async fn install(
        &self,
        slot: &mut HandleSlot,
        cancel: &CancellationToken,
    ) -> Result<(StartPath, bool, u32)> {
        self.set_state(ServiceState::Installing);
        tracing::info!(
            "Installing Keycloak into {}",
            self.markers.state_dir().display()
        );

        self.runtime.extract_bootstrap().await.map_err(Error::Extract)?;

        // First boot initialises the database, then is restarted
        Self::ensure_not_cancelled(cancel)?;
        self.launch(slot).await?;
        let mut probes = self.await_ready(cancel).await?;
        self.stop(slot).await?;
        self.set_state(ServiceState::Installing);

        self.settle.settle(self.runtime.as_ref()).await;

        Self::ensure_not_cancelled(cancel)?;
        self.launch(slot).await?;
        probes += self.await_ready(cancel).await?;

        Self::ensure_not_cancelled(cancel)?;
        tracing::info!("Initializing Keycloak realm");
        self.runtime
            .exec(&self.init_command)
            .await
            .map_err(Error::Init)?;

        self.set_state(ServiceState::Healthy);
        tracing::info!("Keycloak installed");
        Ok((StartPath::Install, true, probes))
    }

    async fn resume(
        &self,
        slot: &mut HandleSlot,
        cancel: &CancellationToken,
    ) -> Result<(StartPath, bool, u32)> {
        self.set_state(ServiceState::Starting);
        tracing::info!("Starting installed Keycloak");

        self.launch(slot).await?;
        self.set_state(ServiceState::Running);

        if !self.resume_waits_for_ready {
            return Ok((StartPath::Resume, false, 0));
        }
        let probes = self.await_ready(cancel).await?;
        self.set_state(ServiceState::Healthy);
        Ok((StartPath::Resume, true, probes))
    }

    async fn launch(&self, slot: &mut HandleSlot) -> Result<()> {
        let process = self.runtime.run().await.map_err(Error::Launch)?;
        tracing::info!(
            "Launched container '{}' (pid {:?})",
            self.runtime.container_name(),
            process.pid()
        );
        *slot = Some(process);
        Ok(())
    }

    async fn await_ready(&self, cancel: &CancellationToken) -> Result<u32> {
        tracing::info!(
            "Waiting for Keycloak to report {} (every {:?})",
            READY_STATUS,
            self.waiter.interval()
        );
        self.waiter.wait_until_up(self.probe.as_ref(), cancel).await
    }

    fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::WaitCancelled);
        }
        Ok(())
    }

    async fn stop(&self, slot: &mut HandleSlot) -> Result<StopOutcome> {
        // A handle that fails to take the signal is stale; it is dropped either way
        let mut process = slot.take().ok_or(Error::NotRunning)?;
        let pid = process.pid();

        if let Err(e) = process.terminate() {
            self.set_state(ServiceState::Stopped);
            return Err(Error::SignalFailed(e));
        }
        tracing::info!("Sent SIGTERM to Keycloak (pid {:?})", pid);

        let kill_error = self.kill_by_name().await;
        self.set_state(ServiceState::Stopped);

        Ok(StopOutcome { pid, kill_error })
    }

    /// Best-effort kill of the named container. The failure is logged and
    /// handed back to the caller for reporting.
    async fn kill_by_name(&self) -> Option<RuntimeError> {
        match self.runtime.kill_by_name().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    "Failed to kill container '{}': {}",
                    self.runtime.container_name(),
                    e
                );
                Some(e)
            }
        }
    }
}
