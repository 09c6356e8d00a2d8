//! c8run library
//!
//! Local launcher for a Camunda 8 distribution: starts Elasticsearch, the
//! connector runtime and the Camunda server in order, gates each step on an
//! HTTP readiness probe, and stops them again through pid files and
//! process-tree kill.

pub mod clean;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod runtime;
pub mod signal;

// Re-export commonly used types for convenience
pub use config::C8RunConfig;
pub use crate::core::models::*;
pub use crate::core::process_tree::{ProcessEntry, ProcessTree, ProcessTreeError};
pub use error::{C8RunError, C8RunResult, ErrorCategory};
pub use health::{HealthPoller, HttpProbe, PollOutcome, ProbeError, ReadinessProbe};
pub use lifecycle::{LifecycleManager, StartOutcome, StopOutcome};
pub use platform::{LaunchContext, Platform};
