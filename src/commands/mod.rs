//! Command line interface

pub mod parser;

pub use parser::{parse_run_options, Cli, Invocation, ParseError, RunOptions, Verb};
