//! Line-oriented JSON I/O for the CLI
//!
//! Requests arrive one JSON object per line on stdin; every reply is one
//! envelope per line on stdout. Logs never touch stdout, so piped output
//! stays parseable.

use std::io::{self, BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};
use crate::api::Response;

/// Reads one JSON value from stdin. Used by one-shot commands.
pub fn read_request() -> CliResult<Value> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Streams JSON values from stdin until EOF. Used by the serving loop.
///
/// Blank lines yield nothing rather than an error, so a trailing
/// newline never aborts the loop.
pub fn read_requests() -> impl Iterator<Item = CliResult<Value>> {
    io::stdin().lock().lines().filter_map(|read| match read {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(serde_json::from_str(&line).map_err(CliError::from)),
        Err(e) => Some(Err(CliError::from(e))),
    })
}

/// Prints a success envelope wrapping `data`.
pub fn write_response(data: Value) -> CliResult<()> {
    write_json(&Response::success(data).to_json())
}

/// Prints an error envelope with the given code and message.
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let envelope = Response::Error {
        code: code.to_string(),
        message: message.to_string(),
    };
    write_json(&envelope.to_json())
}

/// Prints one pre-rendered JSON line and flushes.
pub fn write_json(json: &str) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    stdout.flush()?;
    Ok(())
}
