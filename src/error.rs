//! Unified error handling for c8run
//!
//! Every fatal condition of a `start`/`stop`/`clean` run ends up as a
//! [`C8RunError`]. Best-effort failures (browser launch, a process that is
//! already gone at stop time, a malformed pid file) are logged where they
//! happen and never reach this type.

use crate::core::models::Service;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the launcher
#[derive(Error, Debug)]
pub enum C8RunError {
    /// Neither `JAVA_HOME` nor `PATH` yields a java binary
    #[error("Java runtime not found: {message}")]
    RuntimeNotFound { message: String },

    /// The version probe produced output we cannot interpret
    #[error("Unable to determine Java version from '{output}'")]
    RuntimeVersionUnknown { output: String },

    /// Java is installed but older than required
    #[error("Java {found} is older than the required major version {required}")]
    RuntimeTooOld { found: String, required: u32 },

    /// Host operating system has no platform adapter
    #[error("Unsupported operating system: {os}")]
    UnsupportedPlatform { os: String },

    /// The OS process for a service could not be spawned
    #[error("Failed to launch {service}: {source}")]
    Launch {
        service: Service,
        #[source]
        source: io::Error,
    },

    /// A log or pid file could not be created, written or removed
    #[error("Filesystem error on {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Health poller exhausted its retry budget
    #[error("{service} did not start after {attempts} readiness probes")]
    NotReady { service: Service, attempts: u32 },

    /// `clean` found a service that is still running
    #[error("{service} is still running (pid {pid})")]
    StillRunning { service: Service, pid: u32 },

    /// Unknown flag or a `--config` without its value
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Verb recognized but not handled by this launcher
    #[error("Unsupported command: {command}")]
    UnsupportedCommand { command: String },

    /// Anything else coming out of the standard library
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse error classes used for user messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Environment,
    Launch,
    Readiness,
    Usage,
}

impl ErrorCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ErrorCategory::Environment => "environment",
            ErrorCategory::Launch => "launch",
            ErrorCategory::Readiness => "readiness",
            ErrorCategory::Usage => "usage",
        }
    }
}

impl C8RunError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        C8RunError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            C8RunError::RuntimeNotFound { .. }
            | C8RunError::RuntimeVersionUnknown { .. }
            | C8RunError::RuntimeTooOld { .. }
            | C8RunError::UnsupportedPlatform { .. } => ErrorCategory::Environment,
            C8RunError::Launch { .. } | C8RunError::Filesystem { .. } | C8RunError::Io(_) => {
                ErrorCategory::Launch
            }
            C8RunError::NotReady { .. } => ErrorCategory::Readiness,
            C8RunError::InvalidArguments { .. }
            | C8RunError::StillRunning { .. }
            | C8RunError::UnsupportedCommand { .. } => ErrorCategory::Usage,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            C8RunError::RuntimeNotFound { .. } => {
                "Failed to find JAVA_HOME or java program.".to_string()
            }
            C8RunError::RuntimeVersionUnknown { .. } => format!(
                "Java needs to be installed. Please install JDK {} or newer.\n\
                 If java is already installed, try explicitly setting JAVA_HOME and JAVA_VERSION",
                crate::config::MIN_JAVA_VERSION
            ),
            C8RunError::RuntimeTooOld { required, .. } => {
                format!("You must use at least JDK {required} to start Camunda Platform Run.")
            }
            C8RunError::NotReady { service, .. } => format!("Error: {service} did not start!"),
            C8RunError::StillRunning { service, .. } => {
                format!("{service} is still running. Run 'c8run stop' first.")
            }
            other => other.to_string(),
        }
    }
}

pub type C8RunResult<T> = Result<T, C8RunError>;
