//! Windows platform adapter

use super::{LaunchContext, Platform, CONNECTOR_RUNTIME_MAIN};
use crate::config::CONNECTORS_PROPERTIES;
use crate::core::models::{LaunchSpec, Service};
use crate::core::process_tree::{ProcessEntry, ProcessTreeError};
use std::io;
use std::path::Path;
use std::process::Command;

#[cfg(windows)]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Windows adapter. Batch launchers go through `cmd /C`; process table and
/// kill go through a sysinfo snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }
}

/// Backslash-joined path, independent of the host separator
fn win_path(base: &Path, parts: &[&str]) -> String {
    let mut path = base.display().to_string();
    for part in parts {
        if !path.ends_with('\\') {
            path.push('\\');
        }
        path.push_str(part);
    }
    path
}

#[cfg(windows)]
fn snapshot() -> System {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);
    system
}

impl Platform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn launch_command(&self, service: Service, ctx: &LaunchContext<'_>) -> LaunchSpec {
        let config = ctx.config;
        let base_dir = &config.base_dir;
        let spec = match service {
            Service::Elasticsearch => {
                let launcher = win_path(
                    base_dir,
                    &[
                        &format!("elasticsearch-{}", config.elasticsearch_version),
                        "bin",
                        "elasticsearch.bat",
                    ],
                );
                LaunchSpec::new("cmd").args([
                    "/C".to_string(),
                    launcher,
                    "-E".to_string(),
                    "xpack.ml.enabled=false".to_string(),
                    "-E".to_string(),
                    "xpack.security.enabled=false".to_string(),
                ])
            }
            Service::Connectors => {
                let classpath = format!(
                    "{};.\\custom_connectors\\*;.\\camunda-zeebe-{}\\lib\\*",
                    win_path(base_dir, &["*"]),
                    config.camunda_version
                );
                LaunchSpec::new(ctx.java_binary).args([
                    "-classpath".to_string(),
                    classpath,
                    CONNECTOR_RUNTIME_MAIN.to_string(),
                    format!("--spring.config.location=.\\{CONNECTORS_PROPERTIES}"),
                ])
            }
            Service::Camunda => {
                let launcher = win_path(
                    base_dir,
                    &[
                        &format!("camunda-zeebe-{}", config.camunda_version),
                        "bin",
                        "camunda.bat",
                    ],
                );
                LaunchSpec::new("cmd")
                    .args(["/C".to_string(), launcher])
                    .args(ctx.extra_args.iter().cloned())
            }
        };
        spec.current_dir(base_dir)
    }

    fn java_binary_names(&self) -> &'static [&'static str] {
        &["java.exe", "java"]
    }

    #[cfg(windows)]
    fn process_table(&self) -> Result<Vec<ProcessEntry>, ProcessTreeError> {
        let system = snapshot();
        if system.processes().is_empty() {
            return Err(ProcessTreeError::ProcessInfo(
                "process snapshot came back empty".to_string(),
            ));
        }
        let entries = system
            .processes()
            .values()
            .map(|process| {
                ProcessEntry::new(
                    process.pid().as_u32(),
                    process.parent().map(|parent| parent.as_u32()),
                )
            })
            .collect();
        Ok(entries)
    }

    #[cfg(not(windows))]
    fn process_table(&self) -> Result<Vec<ProcessEntry>, ProcessTreeError> {
        Err(ProcessTreeError::UnsupportedPlatform(self.name()))
    }

    #[cfg(windows)]
    fn terminate(&self, pid: u32) -> io::Result<()> {
        let system = snapshot();
        match system.process(Pid::from_u32(pid)) {
            Some(process) => {
                if !process.kill() {
                    tracing::debug!("pid={} did not accept kill, likely exiting", pid);
                }
                Ok(())
            }
            None => {
                tracing::debug!("pid={} already gone", pid);
                Ok(())
            }
        }
    }

    #[cfg(not(windows))]
    fn terminate(&self, _pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "windows process control is not available on this host",
        ))
    }

    #[cfg(windows)]
    fn process_alive(&self, pid: u32) -> bool {
        snapshot().process(Pid::from_u32(pid)).is_some()
    }

    #[cfg(not(windows))]
    fn process_alive(&self, _pid: u32) -> bool {
        false
    }

    #[cfg(windows)]
    fn prepare_command(&self, command: &mut Command) {
        use std::os::windows::process::CommandExt;
        command.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }

    #[cfg(not(windows))]
    fn prepare_command(&self, _command: &mut Command) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::C8RunConfig;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn context<'a>(config: &'a C8RunConfig, extra: &'a [String]) -> LaunchContext<'a> {
        LaunchContext {
            config,
            java_binary: Path::new("C:\\jdk-21\\bin\\java.exe"),
            extra_args: extra,
        }
    }

    #[test]
    fn test_win_path_joins_with_backslash() {
        assert_eq!(
            win_path(Path::new("C:\\c8run"), &["bin", "camunda.bat"]),
            "C:\\c8run\\bin\\camunda.bat"
        );
        assert_eq!(win_path(Path::new("C:\\"), &["*"]), "C:\\*");
    }

    #[test]
    fn test_elasticsearch_goes_through_cmd() {
        let config = C8RunConfig::new("C:\\c8run");
        let spec = WindowsPlatform.launch_command(Service::Elasticsearch, &context(&config, &[]));
        assert_eq!(spec.program, PathBuf::from("cmd"));
        assert_eq!(
            spec.args_lossy(),
            vec![
                "/C",
                "C:\\c8run\\elasticsearch-8.13.4\\bin\\elasticsearch.bat",
                "-E",
                "xpack.ml.enabled=false",
                "-E",
                "xpack.security.enabled=false",
            ]
        );
    }

    #[test]
    fn test_connectors_classpath_uses_semicolons() {
        let config = C8RunConfig::new("C:\\c8run");
        let spec = WindowsPlatform.launch_command(Service::Connectors, &context(&config, &[]));
        assert_eq!(spec.program, PathBuf::from("C:\\jdk-21\\bin\\java.exe"));
        assert_eq!(
            spec.args_lossy()[1],
            "C:\\c8run\\*;.\\custom_connectors\\*;.\\camunda-zeebe-8.7.0-alpha1\\lib\\*"
        );
    }

    #[test]
    fn test_camunda_command_appends_extra_args() {
        let config = C8RunConfig::new("C:\\c8run");
        let extra = vec!["--spring.config.location=C:\\c8run\\configuration".to_string()];
        let spec = WindowsPlatform.launch_command(Service::Camunda, &context(&config, &extra));
        assert_eq!(
            spec.args_lossy(),
            vec![
                "/C",
                "C:\\c8run\\camunda-zeebe-8.7.0-alpha1\\bin\\camunda.bat",
                "--spring.config.location=C:\\c8run\\configuration",
            ]
        );
    }

    #[cfg(windows)]
    #[test]
    fn test_process_table_contains_current_process() {
        let entries = WindowsPlatform.process_table().expect("process table");
        let me = std::process::id();
        assert!(entries.iter().any(|entry| entry.pid == me));
    }

    #[test]
    fn test_java_names_prefer_exe() {
        assert_eq!(WindowsPlatform.java_binary_names(), &["java.exe", "java"]);
    }
}
