//! Core data model
//!
//! The three managed services, how to launch them, and the per-service state
//! the lifecycle manager tracks while driving a start or stop sequence.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// One of the orchestrated processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Elasticsearch,
    Connectors,
    Camunda,
}

impl Service {
    /// Start order. Stop walks the same order.
    pub const ALL: [Service; 3] = [Service::Elasticsearch, Service::Connectors, Service::Camunda];

    /// Display label
    pub fn display_name(&self) -> &'static str {
        match self {
            Service::Elasticsearch => "Elasticsearch",
            Service::Connectors => "Connectors",
            Service::Camunda => "Camunda",
        }
    }

    /// File stem used for `<service>.pid` and `log/<service>.log`
    pub fn file_stem(&self) -> &'static str {
        match self {
            Service::Elasticsearch => "elasticsearch",
            Service::Connectors => "connectors",
            Service::Camunda => "camunda",
        }
    }

    pub fn pid_file_path(&self, working_dir: &Path) -> PathBuf {
        working_dir.join(format!("{}.pid", self.file_stem()))
    }

    pub fn log_file_path(&self, working_dir: &Path) -> PathBuf {
        working_dir
            .join("log")
            .join(format!("{}.log", self.file_stem()))
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Executable, arguments, working directory and extra environment of a child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn envs<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env.extend(vars);
        self
    }

    /// Arguments as lossy strings, handy for logging and assertions
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    /// Build a not-yet-started `Command`. Stdio is left to the caller.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}

/// Readiness gate for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckPolicy {
    pub service_name: String,
    /// Additional attempts after the first one
    pub retry_budget: u32,
    /// Sleep before every probe, the first one included
    pub interval: Duration,
    pub url: String,
}

impl HealthCheckPolicy {
    pub fn new(
        service_name: impl Into<String>,
        retry_budget: u32,
        interval: Duration,
        url: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            retry_budget,
            interval,
            url: url.into(),
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.retry_budget.saturating_add(1)
    }
}

/// Lifecycle of a managed process within one launcher run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    NotStarted,
    Launching,
    AwaitingHealth,
    Ready,
    Failed,
    Stopping,
    Stopped,
}

impl ServiceState {
    pub fn can_transition_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (NotStarted, Launching)
                | (Launching, AwaitingHealth)
                | (Launching, Ready)
                | (Launching, Failed)
                | (AwaitingHealth, Ready)
                | (AwaitingHealth, Failed)
                | (Ready, Stopping)
                | (Failed, Stopping)
                | (NotStarted, Stopping)
                | (Stopping, Stopped)
        )
    }
}

/// A service under orchestration
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    pub service: Service,
    pub launch: LaunchSpec,
    pub log_file_path: PathBuf,
    pub pid_file_path: PathBuf,
    pub readiness: Option<HealthCheckPolicy>,
    pub pid: Option<u32>,
    state: ServiceState,
}

impl ManagedProcess {
    pub fn new(service: Service, launch: LaunchSpec, working_dir: &Path) -> Self {
        Self {
            service,
            launch,
            log_file_path: service.log_file_path(working_dir),
            pid_file_path: service.pid_file_path(working_dir),
            readiness: None,
            pid: None,
            state: ServiceState::NotStarted,
        }
    }

    pub fn with_readiness(mut self, policy: Option<HealthCheckPolicy>) -> Self {
        self.readiness = policy;
        self
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Move to `next`. Invalid transitions are logged and ignored.
    pub fn transition(&mut self, next: ServiceState) {
        if self.state.can_transition_to(next) {
            tracing::debug!(service = %self.service, from = ?self.state, to = ?next, "state change");
            self.state = next;
        } else {
            tracing::warn!(
                service = %self.service,
                from = ?self.state,
                to = ?next,
                "ignoring invalid state transition"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_file_paths() {
        let base = Path::new("/opt/c8run");
        assert_eq!(
            Service::Connectors.pid_file_path(base),
            PathBuf::from("/opt/c8run/connectors.pid")
        );
        assert_eq!(
            Service::Camunda.log_file_path(base),
            PathBuf::from("/opt/c8run/log/camunda.log")
        );
    }

    #[test]
    fn test_total_attempts_includes_first_probe() {
        let policy = HealthCheckPolicy::new("Elasticsearch", 12, Duration::from_secs(10), "x");
        assert_eq!(policy.total_attempts(), 13);
        let policy = HealthCheckPolicy::new("Elasticsearch", 0, Duration::ZERO, "x");
        assert_eq!(policy.total_attempts(), 1);
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut process = ManagedProcess::new(
            Service::Elasticsearch,
            LaunchSpec::new("elasticsearch"),
            Path::new("."),
        );
        process.transition(ServiceState::Launching);
        process.transition(ServiceState::AwaitingHealth);
        process.transition(ServiceState::Ready);
        assert_eq!(process.state(), ServiceState::Ready);

        // Ready cannot go back to Launching
        process.transition(ServiceState::Launching);
        assert_eq!(process.state(), ServiceState::Ready);

        process.transition(ServiceState::Stopping);
        process.transition(ServiceState::Stopped);
        assert_eq!(process.state(), ServiceState::Stopped);
    }

    #[test]
    fn test_launch_spec_builder() {
        let spec = LaunchSpec::new("java")
            .arg("-classpath")
            .args(["a", "b"])
            .current_dir("/tmp")
            .envs([("K".to_string(), "V".to_string())]);
        assert_eq!(spec.args_lossy(), vec!["-classpath", "a", "b"]);
        assert_eq!(spec.current_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(spec.env, vec![("K".to_string(), "V".to_string())]);
    }
}
