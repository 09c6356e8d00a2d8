//! Linux and macOS platform adapter

use super::{LaunchContext, Platform, CONNECTOR_RUNTIME_MAIN};
use crate::config::CONNECTORS_PROPERTIES;
use crate::core::models::{LaunchSpec, Service};
use crate::core::process_tree::{ProcessEntry, ProcessTreeError};
use std::io;
use std::process::Command;
use tracing::debug;

/// Linux and macOS adapter. Process table via psutil, kill via nix.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for UnixPlatform {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn launch_command(&self, service: Service, ctx: &LaunchContext<'_>) -> LaunchSpec {
        let config = ctx.config;
        let base_dir = &config.base_dir;
        let spec = match service {
            Service::Elasticsearch => {
                LaunchSpec::new(config.elasticsearch_dir().join("bin").join("elasticsearch")).args([
                    "-E",
                    "xpack.ml.enabled=false",
                    "-E",
                    "xpack.security.enabled=false",
                ])
            }
            Service::Connectors => {
                let classpath = format!(
                    "{}/*:./custom_connectors/*:./camunda-zeebe-{}/lib/*",
                    base_dir.display(),
                    config.camunda_version
                );
                LaunchSpec::new(ctx.java_binary).args([
                    "-classpath".to_string(),
                    classpath,
                    CONNECTOR_RUNTIME_MAIN.to_string(),
                    format!("--spring.config.location=./{CONNECTORS_PROPERTIES}"),
                ])
            }
            Service::Camunda => LaunchSpec::new(config.camunda_dir().join("bin").join("camunda"))
                .args(ctx.extra_args.iter().cloned()),
        };
        spec.current_dir(base_dir)
    }

    fn java_binary_names(&self) -> &'static [&'static str] {
        &["java"]
    }

    #[cfg(unix)]
    fn process_table(&self) -> Result<Vec<ProcessEntry>, ProcessTreeError> {
        let processes = psutil::process::processes()?;
        let entries = processes
            .into_iter()
            // Err means the process went away between listing and reading
            .filter_map(|process| process.ok())
            .map(|process| {
                let parent = process.ppid().ok().flatten();
                ProcessEntry::new(process.pid(), parent)
            })
            .collect();
        Ok(entries)
    }

    #[cfg(not(unix))]
    fn process_table(&self) -> Result<Vec<ProcessEntry>, ProcessTreeError> {
        Err(ProcessTreeError::UnsupportedPlatform(self.name()))
    }

    #[cfg(unix)]
    fn terminate(&self, pid: u32) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid).map_err(|_| io::Error::other(format!("pid {pid} out of range")))?;
        match kill(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => {
                debug!("pid={} sent SIGKILL", pid);
                Ok(())
            }
            Err(Errno::ESRCH) => {
                debug!("pid={} already gone", pid);
                Ok(())
            }
            Err(errno) => Err(io::Error::from(errno)),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self, _pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "unix process control is not available on this host",
        ))
    }

    #[cfg(unix)]
    fn process_alive(&self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        match kill(Pid::from_raw(raw), None) {
            Ok(()) => true,
            // EPERM means the process exists but belongs to someone else
            Err(errno) => errno == Errno::EPERM,
        }
    }

    #[cfg(not(unix))]
    fn process_alive(&self, _pid: u32) -> bool {
        false
    }

    #[cfg(unix)]
    fn prepare_command(&self, command: &mut Command) {
        use nix::unistd::{setpgid, Pid};
        use std::os::unix::process::CommandExt;

        // SAFETY: setpgid is async-signal-safe and touches no shared state.
        unsafe {
            command.pre_exec(|| {
                setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(io::Error::from)
            });
        }
    }

    #[cfg(not(unix))]
    fn prepare_command(&self, _command: &mut Command) {}
}
