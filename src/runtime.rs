//! Java runtime discovery and version gate

use crate::config::C8RunConfig;
use crate::error::{C8RunError, C8RunResult};
use crate::platform::Platform;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Resolved java installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRuntime {
    pub binary: PathBuf,
    pub home: PathBuf,
}

/// Find the java binary: inside `JAVA_HOME` when set, otherwise on `PATH`.
pub fn locate_java(config: &C8RunConfig, platform: &dyn Platform) -> C8RunResult<JavaRuntime> {
    match &config.java_home {
        Some(java_home) => locate_in_home(java_home, platform.java_binary_names()),
        None => locate_on_path(),
    }
}

fn locate_in_home(java_home: &Path, names: &[&str]) -> C8RunResult<JavaRuntime> {
    let home = fs::canonicalize(java_home).map_err(|err| C8RunError::RuntimeNotFound {
        message: format!("JAVA_HOME {} is not accessible: {err}", java_home.display()),
    })?;

    for name in names {
        let candidate = home.join("bin").join(name);
        if candidate.is_file() {
            return Ok(JavaRuntime {
                binary: candidate,
                home,
            });
        }
    }

    // Some distributions nest the JDK one level deeper than JAVA_HOME
    let found = WalkDir::new(&home)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| {
            entry.file_type().is_file()
                && names
                    .iter()
                    .any(|name| entry.file_name().to_string_lossy() == *name)
        });

    match found {
        Some(entry) => Ok(JavaRuntime {
            binary: entry.into_path(),
            home,
        }),
        None => Err(C8RunError::RuntimeNotFound {
            message: format!("no java binary below {}", home.display()),
        }),
    }
}

fn locate_on_path() -> C8RunResult<JavaRuntime> {
    let path = which::which("java").map_err(|err| C8RunError::RuntimeNotFound {
        message: format!("'java' not found in PATH: {err}"),
    })?;
    let binary = fs::canonicalize(&path).unwrap_or(path);
    // java is not guaranteed to live in a bin folder; go up two levels anyway
    let home = binary
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));
    Ok(JavaRuntime { binary, home })
}

/// Second whitespace-separated token of `java --version` output,
/// e.g. `openjdk 21.0.2 2024-01-16` yields `21.0.2`.
pub fn parse_version_output(output: &str) -> Option<String> {
    output.split_whitespace().nth(1).map(str::to_string)
}

/// Leading number of a version string: `21.0.2` -> 21, `17-ea` -> 17
pub fn major_version(version: &str) -> Option<u32> {
    let head = version.trim().split('.').next()?;
    let digits: String = head.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Version string to use: the `JAVA_VERSION` override, or the probe output
pub fn detect_version(
    config: &C8RunConfig,
    platform: &dyn Platform,
    java: &JavaRuntime,
) -> C8RunResult<String> {
    if let Some(version) = &config.java_version {
        debug!("using JAVA_VERSION override {}", version);
        return Ok(version.clone());
    }

    let output = platform
        .probe_runtime_version(&java.binary)
        .unwrap_or_else(|err| {
            warn!("java version probe failed: {}", err);
            String::new()
        });
    parse_version_output(&output).ok_or(C8RunError::RuntimeVersionUnknown { output })
}

/// Reject runtimes below the required major version
pub fn ensure_minimum(version: &str, required: u32) -> C8RunResult<()> {
    let major = major_version(version).unwrap_or(0);
    if major < required {
        return Err(C8RunError::RuntimeTooOld {
            found: version.to_string(),
            required,
        });
    }
    Ok(())
}
