//! Recording fakes for the container runtime and the readiness probe.

#![allow(dead_code)]

use async_trait::async_trait;
use idp_supervisor::healthcheck::{HealthProbe, ProbeError};
use idp_supervisor::runtime::{ContainerHandle, ContainerRuntime, RuntimeError};
use idp_supervisor::SupervisorConfig;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// One observable interaction with the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    KillByName,
    Extract,
    Run(u32),
    Exec(Vec<String>),
    Terminate(u32),
    Exists,
    Probe,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// The log with every run of consecutive probes collapsed into one `Probe`.
pub fn phases(log: &CallLog) -> Vec<Call> {
    let mut out: Vec<Call> = Vec::new();
    for call in log.lock().iter() {
        if *call == Call::Probe && out.last() == Some(&Call::Probe) {
            continue;
        }
        out.push(call.clone());
    }
    out
}

pub fn count(log: &CallLog, pred: impl Fn(&Call) -> bool) -> usize {
    log.lock().iter().filter(|c| pred(c)).count()
}

pub fn config_for(workdir: &Path) -> SupervisorConfig {
    SupervisorConfig {
        workdir: Some(workdir.to_path_buf()),
        ..SupervisorConfig::default()
    }
}

pub fn write_marker(workdir: &Path) {
    let state_dir = workdir.join("keycloak");
    std::fs::create_dir_all(&state_dir).unwrap();
    std::fs::write(state_dir.join("version.txt"), "").unwrap();
}

#[derive(Debug)]
pub struct FakeHandle {
    pid: u32,
    log: CallLog,
    fail_terminate: bool,
}

impl ContainerHandle for FakeHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn terminate(&mut self) -> Result<(), RuntimeError> {
        if self.fail_terminate {
            return Err(RuntimeError::ProcessExited {
                pid: Some(self.pid),
                status: "exit status: 0".to_string(),
            });
        }
        self.log.lock().push(Call::Terminate(self.pid));
        Ok(())
    }
}

/// Container runtime that records calls and fails on request.
#[derive(Default)]
pub struct FakeRuntime {
    log: CallLog,
    next_pid: AtomicU32,
    pub fail_kill: bool,
    pub fail_extract: bool,
    pub fail_run: bool,
    pub fail_exec: bool,
    pub fail_terminate: bool,
    /// Written when the init exec runs, like the real image does.
    pub marker_on_init: Option<PathBuf>,
    /// Answers for `container_exists`; `false` once drained.
    pub exists_answers: Mutex<VecDeque<bool>>,
}

impl FakeRuntime {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            next_pid: AtomicU32::new(1000),
            ..Self::default()
        }
    }

    fn command_failed(command: &str) -> RuntimeError {
        RuntimeError::CommandFailed {
            command: command.to_string(),
            exit_code: Some(125),
        }
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    fn container_name(&self) -> &str {
        "keycloak"
    }

    async fn extract_bootstrap(&self) -> Result<(), RuntimeError> {
        self.log.lock().push(Call::Extract);
        if self.fail_extract {
            return Err(Self::command_failed("podman run /home/keycloak/extract"));
        }
        Ok(())
    }

    async fn run(&self) -> Result<Box<dyn ContainerHandle>, RuntimeError> {
        if self.fail_run {
            return Err(RuntimeError::exec_failed(
                "podman run",
                std::io::Error::new(std::io::ErrorKind::NotFound, "podman not found"),
            ));
        }
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(Call::Run(pid));
        Ok(Box::new(FakeHandle {
            pid,
            log: Arc::clone(&self.log),
            fail_terminate: self.fail_terminate,
        }))
    }

    async fn exec(&self, command: &[String]) -> Result<(), RuntimeError> {
        self.log.lock().push(Call::Exec(command.to_vec()));
        if self.fail_exec {
            return Err(Self::command_failed("podman exec keycloak /home/keycloak/init"));
        }
        if let Some(marker) = &self.marker_on_init {
            std::fs::write(marker, "24.0.0").unwrap();
        }
        Ok(())
    }

    async fn kill_by_name(&self) -> Result<(), RuntimeError> {
        self.log.lock().push(Call::KillByName);
        if self.fail_kill {
            return Err(Self::command_failed("podman kill keycloak"));
        }
        Ok(())
    }

    async fn container_exists(&self) -> Result<bool, RuntimeError> {
        self.log.lock().push(Call::Exists);
        Ok(self.exists_answers.lock().pop_front().unwrap_or(false))
    }
}

/// One scripted probe answer.
#[derive(Debug, Clone)]
pub enum Step {
    Status(&'static str),
    /// Fail with a real connection-refused transport error.
    Refused,
}

/// Probe that replays a script, then repeats `fallback` (or panics if none).
pub struct ScriptedProbe {
    log: Option<CallLog>,
    steps: Mutex<VecDeque<Step>>,
    fallback: Option<Step>,
    calls: AtomicU32,
}

impl ScriptedProbe {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            log: None,
            steps: Mutex::new(steps.into_iter().collect()),
            fallback: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn statuses(statuses: &[&'static str]) -> Self {
        Self::new(statuses.iter().map(|s| Step::Status(*s)))
    }

    pub fn always(status: &'static str) -> Self {
        Self::new([]).or_else(Step::Status(status))
    }

    pub fn or_else(mut self, fallback: Step) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn recording(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A loopback URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/health/ready", port)
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self) -> Result<String, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().push(Call::Probe);
        }

        let next = self.steps.lock().pop_front();
        let step = next
            .or_else(|| self.fallback.clone())
            .expect("probe script exhausted");

        match step {
            Step::Status(status) => Ok(status.to_string()),
            Step::Refused => {
                let err = reqwest::Client::new()
                    .get(closed_port_url())
                    .send()
                    .await
                    .expect_err("nothing should be listening");
                Err(ProbeError::Transport(err))
            }
        }
    }
}
