//! Lifecycle manager
//!
//! Single sequential driver for the start and stop sequences. It is the only
//! place that decides between "abort the whole run" and "log and continue":
//! every start stage failure is fatal and leaves already started siblings
//! running; browser failures and stop-time oddities (missing or malformed
//! pid file, vanished process) are logged and swallowed.

use crate::config::{C8RunConfig, OPERATE_URL};
use crate::core::models::{HealthCheckPolicy, LaunchSpec, ManagedProcess, Service, ServiceState};
use crate::core::pid_file::{self, PersistedPid};
use crate::core::process_tree::ProcessTree;
use crate::error::{C8RunError, C8RunResult};
use crate::health::{HealthPoller, ReadinessProbe};
use crate::platform::{LaunchContext, Platform};
use crate::runtime::{self, JavaRuntime};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use tracing::{debug, info, warn};

/// What a stop attempt found for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// No pid file: treated as already stopped
    NotRunning,
    /// Pid file did not hold a positive integer; nothing was killed
    MalformedPid,
    /// Kill was sent to every pid of the tree rooted at `pid`
    Stopped { pid: u32, tree: Vec<u32> },
}

/// Result of a start that can be cut short by a shutdown signal
#[derive(Debug)]
pub enum StartOutcome {
    Started(Vec<ManagedProcess>),
    /// Shutdown arrived before Camunda was ready; whatever was launched has
    /// been stopped again
    Interrupted,
}

pub struct LifecycleManager<'a> {
    config: &'a C8RunConfig,
    platform: &'a dyn Platform,
    probe: &'a dyn ReadinessProbe,
}

impl<'a> LifecycleManager<'a> {
    pub fn new(
        config: &'a C8RunConfig,
        platform: &'a dyn Platform,
        probe: &'a dyn ReadinessProbe,
    ) -> Self {
        Self {
            config,
            platform,
            probe,
        }
    }

    /// Resolve java, then start Elasticsearch, Connectors and Camunda in that
    /// order. Returns the started processes, all `Ready`.
    pub async fn start(&self, user_config: Option<&Path>) -> C8RunResult<Vec<ManagedProcess>> {
        let (java, java_version) = self.resolve_runtime()?;

        let log_dir = self.config.log_dir();
        fs::create_dir_all(&log_dir).map_err(|err| C8RunError::filesystem(&log_dir, err))?;

        let extra_args = [self.config.spring_config_arg(user_config)];
        let ctx = LaunchContext {
            config: self.config,
            java_binary: &java.binary,
            extra_args: &extra_args,
        };

        let mut started = Vec::with_capacity(Service::ALL.len());
        for service in Service::ALL {
            let launch = self
                .platform
                .launch_command(service, &ctx)
                .envs(self.config.child_env(service, &java.home, &java_version));
            let mut process = ManagedProcess::new(service, launch, &self.config.base_dir)
                .with_readiness(self.readiness_policy(service));

            self.announce(service);
            self.launch(&mut process)?;
            self.await_ready(&mut process).await?;
            started.push(process);
        }

        if let Err(err) = self.platform.open_browser(OPERATE_URL) {
            // Headless hosts (CI, containers) commonly have no browser
            println!("Failed to open browser");
            warn!("browser launch failed: {}", err);
        }
        self.print_status();

        Ok(started)
    }

    /// [`start`](Self::start), racing `shutdown`. If `shutdown` completes
    /// first the partial start is abandoned and the stop sequence runs over
    /// the pid files written so far.
    pub async fn start_or_interrupt<F>(
        &self,
        user_config: Option<&Path>,
        shutdown: F,
    ) -> C8RunResult<StartOutcome>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            started = self.start(user_config) => started.map(StartOutcome::Started),
            () = shutdown => {
                println!("Interrupted during startup, stopping launched services.");
                self.stop()?;
                Ok(StartOutcome::Interrupted)
            }
        }
    }

    /// Stop every service that has a pid file, in start order
    pub fn stop(&self) -> C8RunResult<Vec<(Service, StopOutcome)>> {
        let mut outcomes = Vec::with_capacity(Service::ALL.len());
        for service in Service::ALL {
            let outcome = self.stop_service(service)?;
            println!("{service} is stopped.");
            outcomes.push((service, outcome));
        }
        Ok(outcomes)
    }

    /// Stop processes started by this run, tracking their state
    pub fn stop_started(&self, processes: &mut [ManagedProcess]) -> C8RunResult<()> {
        for process in processes.iter_mut() {
            process.transition(ServiceState::Stopping);
            self.stop_service(process.service)?;
            process.transition(ServiceState::Stopped);
            println!("{} is stopped.", process.service);
        }
        Ok(())
    }

    /// Kill the process tree recorded in `service`'s pid file, then remove
    /// the file. Removal happens whatever the kills report.
    pub fn stop_service(&self, service: Service) -> C8RunResult<StopOutcome> {
        let pid_path = service.pid_file_path(&self.config.base_dir);

        let outcome = match pid_file::read(&pid_path) {
            None => {
                debug!("{} has no pid file, nothing to stop", service);
                return Ok(StopOutcome::NotRunning);
            }
            Some(PersistedPid::Malformed) => {
                warn!("ignoring malformed pid file {}", pid_path.display());
                StopOutcome::MalformedPid
            }
            Some(PersistedPid::Valid(pid)) => {
                let tree = self.platform.process_tree(pid).unwrap_or_else(|err| {
                    warn!("cannot enumerate children of {}: {}", pid, err);
                    ProcessTree::root_only(pid)
                });
                for &member in &tree.pids {
                    if let Err(err) = self.platform.terminate(member) {
                        warn!("failed to kill pid {} of {}: {}", member, service, err);
                    }
                }
                info!("{} stopped, killed {:?}", service, tree.pids);
                StopOutcome::Stopped {
                    pid,
                    tree: tree.pids,
                }
            }
        };

        pid_file::remove(&pid_path)?;
        Ok(outcome)
    }

    fn resolve_runtime(&self) -> C8RunResult<(JavaRuntime, String)> {
        let java = runtime::locate_java(self.config, self.platform)?;
        debug!("using java binary {}", java.binary.display());

        let version = runtime::detect_version(self.config, self.platform, &java)?;
        println!("Java version is {version}");
        runtime::ensure_minimum(&version, self.config.min_java_version)?;

        if let Some(opts) = &self.config.java_opts {
            println!("JAVA_OPTS: {opts}");
        }
        Ok((java, version))
    }

    fn readiness_policy(&self, service: Service) -> Option<HealthCheckPolicy> {
        match service {
            Service::Elasticsearch => Some(self.config.search_policy.clone()),
            // Connectors readiness is not gated
            Service::Connectors => None,
            Service::Camunda => Some(self.config.server_policy.clone()),
        }
    }

    fn announce(&self, service: Service) {
        match service {
            Service::Elasticsearch => {
                println!("Starting Elasticsearch {}...", self.config.elasticsearch_version);
                println!(
                    "(Hint: you can find the log output in the 'elasticsearch.log' file in the 'log' folder of your distribution.)"
                );
            }
            Service::Connectors => println!("Starting Connectors {}...", self.config.camunda_version),
            Service::Camunda => println!("Starting Camunda {}...", self.config.camunda_version),
        }
    }

    /// Open the log, spawn, persist the pid
    fn launch(&self, process: &mut ManagedProcess) -> C8RunResult<u32> {
        process.transition(ServiceState::Launching);

        let (stdout, stderr) = match open_log(&process.log_file_path, &process.launch) {
            Ok(handles) => handles,
            Err(err) => {
                process.transition(ServiceState::Failed);
                return Err(err);
            }
        };

        let mut command = process.launch.to_command();
        self.platform.prepare_command(&mut command);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        let child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                process.transition(ServiceState::Failed);
                return Err(C8RunError::Launch {
                    service: process.service,
                    source,
                });
            }
        };
        let pid = child.id();
        // Dropping the handle neither kills nor waits; the pid file is the
        // only reference kept from here on.
        drop(child);
        process.pid = Some(pid);
        println!("Process id {pid}");

        if process.pid_file_path.exists() {
            warn!(
                "overwriting existing pid file {}",
                process.pid_file_path.display()
            );
        }
        if let Err(err) = pid_file::write(&process.pid_file_path, pid) {
            process.transition(ServiceState::Failed);
            return Err(err);
        }
        Ok(pid)
    }

    async fn await_ready(&self, process: &mut ManagedProcess) -> C8RunResult<()> {
        let Some(policy) = process.readiness.clone() else {
            process.transition(ServiceState::Ready);
            return Ok(());
        };

        process.transition(ServiceState::AwaitingHealth);
        let outcome = HealthPoller::new(self.probe).await_healthy(&policy).await;
        if outcome.is_ready() {
            process.transition(ServiceState::Ready);
            Ok(())
        } else {
            process.transition(ServiceState::Failed);
            Err(C8RunError::NotReady {
                service: process.service,
                attempts: outcome.attempts(),
            })
        }
    }

    /// Print the endpoints summary the Camunda server writes on startup
    fn print_status(&self) {
        let path = self.config.endpoints_file();
        match fs::read_to_string(&path) {
            Ok(endpoints) => println!("{endpoints}"),
            Err(err) => debug!("no status summary at {}: {}", path.display(), err),
        }
    }
}

/// Append-mode log file with a start header, plus a second handle for stderr
fn open_log(path: &Path, launch: &LaunchSpec) -> C8RunResult<(File, File)> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| C8RunError::filesystem(path, err))?;

    writeln!(
        file,
        "=== {} starting {} {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        launch.program.display(),
        launch.args_lossy().join(" ")
    )
    .map_err(|err| C8RunError::filesystem(path, err))?;

    let stderr = file
        .try_clone()
        .map_err(|err| C8RunError::filesystem(path, err))?;
    Ok((file, stderr))
}
