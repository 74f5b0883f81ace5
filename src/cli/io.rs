//! Line-oriented JSON I/O for the CLI
//!
//! Requests arrive one per line on stdin; each response is one line on
//! stdout. Logs go to stderr and never mix with responses.

use std::io::{self, BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Non-blank request lines from stdin
pub fn read_requests() -> impl Iterator<Item = CliResult<String>> {
    io::stdin()
        .lock()
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
}

/// Writes `{"status":"ok","data":...}`
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_json(&serde_json::to_string(&response)?)
}

/// Writes `{"status":"error","code":...,"message":...}`
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_json(&serde_json::to_string(&response)?)
}

/// Writes one pre-encoded JSON line
pub fn write_json(json_str: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", json_str)?;
    stdout.flush()?;
    Ok(())
}
