//! Command line parsing
//!
//! clap recognizes the verb; the options after it are captured raw and
//! scanned by [`parse_run_options`], which keeps the flag grammar small and
//! order independent.

use crate::error::C8RunError;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "c8run",
    version,
    about = "Start and stop a local Camunda 8 distribution",
    disable_help_flag = true
)]
pub struct Cli {
    /// Action to perform
    #[arg(value_enum)]
    pub verb: Verb,

    /// Options for the verb (`--config <path>`, `--detached`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub options: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Start,
    Stop,
    Package,
    Clean,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Start => "start",
            Verb::Stop => "stop",
            Verb::Package => "package",
            Verb::Clean => "clean",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options shared by every verb
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Application server configuration, relative to the base directory
    pub config: Option<PathBuf>,
    pub detached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unrecognized option '{0}'")]
    UnknownFlag(String),
    #[error("missing value after --config")]
    MissingConfigValue,
    #[error("help requested")]
    HelpRequested,
}

impl From<ParseError> for C8RunError {
    fn from(err: ParseError) -> Self {
        C8RunError::InvalidArguments {
            message: err.to_string(),
        }
    }
}

/// Verb plus its scanned options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub verb: Verb,
    pub options: RunOptions,
}

impl Cli {
    /// Parse the verb with clap (usage errors and `--version` come back as
    /// `clap::Error`)
    pub fn try_parse_command_from<I, T>(iter: I) -> Result<Cli, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(iter)
    }

    pub fn invocation(&self) -> Result<Invocation, ParseError> {
        Ok(Invocation {
            verb: self.verb,
            options: parse_run_options(&self.options)?,
        })
    }
}

/// Scan verb options left to right.
///
/// `--config` takes the next token as its value; a missing value, or one
/// that is itself a `--` flag, is an error. A repeated option keeps the last
/// value.
pub fn parse_run_options(tokens: &[String]) -> Result<RunOptions, ParseError> {
    let mut options = RunOptions::default();
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        match token.as_str() {
            "--config" => {
                let value = iter.next().ok_or(ParseError::MissingConfigValue)?;
                if value.is_empty() || value.starts_with("--") {
                    return Err(ParseError::MissingConfigValue);
                }
                options.config = Some(PathBuf::from(value));
            }
            "--detached" => options.detached = true,
            "-h" | "--help" => return Err(ParseError::HelpRequested),
            other => return Err(ParseError::UnknownFlag(other.to_string())),
        }
    }

    Ok(options)
}
