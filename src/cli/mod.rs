//! Command-line interface
//!
//! Five commands over one JSON config file:
//! - `init`: create the data directory layout and built-in descriptors
//! - `start`: boot and serve JSON requests line-by-line from stdin
//! - `apply`: boot, apply one change event from stdin, exit
//! - `describe`: print a registered aspect descriptor
//! - `query`: boot and query a time-series aspect
//!
//! Responses go to stdout, one JSON object per line. Log events go to
//! stderr so the response stream stays parseable.

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{apply, describe, init, query, run, run_command, start};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
