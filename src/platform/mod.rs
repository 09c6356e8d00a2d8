//! Platform process adapter
//!
//! One capability contract, two implementations: [`UnixPlatform`] for Linux
//! and macOS, [`WindowsPlatform`] for Windows. The implementation is chosen
//! once in `main` via [`current`] and injected into the lifecycle manager.
//!
//! Launch-command construction is pure and compiles everywhere, so both
//! layouts can be inspected from any host. Process-table access, kill and
//! process-group setup are gated on the OS they talk to. No operation here
//! retries internally.

mod unix;
mod windows;

pub use unix::UnixPlatform;
pub use windows::WindowsPlatform;

use crate::config::C8RunConfig;
use crate::core::models::{LaunchSpec, Service};
use crate::core::process_tree::{ProcessEntry, ProcessTree, ProcessTreeError};
use crate::error::{C8RunError, C8RunResult};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

pub const CONNECTOR_RUNTIME_MAIN: &str = "io.camunda.connector.runtime.app.ConnectorRuntimeApplication";

/// Inputs for building a service's launch command
#[derive(Debug, Clone, Copy)]
pub struct LaunchContext<'a> {
    pub config: &'a C8RunConfig,
    pub java_binary: &'a Path,
    /// Appended to the Camunda server command line
    pub extra_args: &'a [String],
}

pub trait Platform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Executable and arguments for `service`. Starts nothing.
    fn launch_command(&self, service: Service, ctx: &LaunchContext<'_>) -> LaunchSpec;

    /// Command that prints the Java runtime version
    fn version_command(&self, java_binary: &Path) -> LaunchSpec {
        LaunchSpec::new(java_binary).arg("--version")
    }

    /// File names that identify a java executable while walking `JAVA_HOME`
    fn java_binary_names(&self) -> &'static [&'static str];

    /// Snapshot of `(pid, parent)` for every visible process. Processes that
    /// vanish while the snapshot is taken are skipped.
    fn process_table(&self) -> Result<Vec<ProcessEntry>, ProcessTreeError>;

    /// `root` plus all transitive children, computed fresh on every call
    fn process_tree(&self, root: u32) -> Result<ProcessTree, ProcessTreeError> {
        let entries = self.process_table()?;
        Ok(ProcessTree::collect(root, &entries))
    }

    /// Immediate kill of a single pid. An already dead pid is not an error.
    fn terminate(&self, pid: u32) -> io::Result<()>;

    fn process_alive(&self, pid: u32) -> bool;

    /// Best effort; callers swallow the error
    fn open_browser(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }

    /// Detach the child from the launcher's console so terminal Ctrl-C only
    /// reaches the launcher.
    fn prepare_command(&self, command: &mut Command);

    /// Run [`Platform::version_command`] and return its stdout
    fn probe_runtime_version(&self, java_binary: &Path) -> io::Result<String> {
        let mut command = self.version_command(java_binary).to_command();
        command.stdin(Stdio::null());
        let output = command.output()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Select the adapter for the host operating system
pub fn current() -> C8RunResult<Box<dyn Platform>> {
    for_os(std::env::consts::OS)
}

pub fn for_os(os: &str) -> C8RunResult<Box<dyn Platform>> {
    match os {
        "windows" => Ok(Box::new(WindowsPlatform::new())),
        "linux" | "macos" => Ok(Box::new(UnixPlatform::new())),
        other => Err(C8RunError::UnsupportedPlatform {
            os: other.to_string(),
        }),
    }
}
