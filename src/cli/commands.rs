//! CLI command implementations
//!
//! Each command loads the config, applies its log level, and works on one
//! clinic session. `start` and `query` always close the session, so index
//! snapshots are written even under the `on_close` flush policy.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::api::{ApiError, ApiHandler, Response};
use crate::clinic::{Clinic, ClinicConfig};
use crate::observability::Logger;
use crate::query::{self, Query};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_error, write_json, write_response};

/// Main CLI entry point; the only function main.rs calls.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, data_dir } => init(&config, &data_dir),
        Command::Start { config } => start(&config),
        Command::Query { config, sql } => query(&config, &sql),
    }
}

/// Writes a default config pointing at `data_dir` and creates an empty
/// data directory with an initial snapshot set.
pub fn init(config_path: &Path, data_dir: &str) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path));
    }

    let config = ClinicConfig::new(data_dir);
    config.validate()?;
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    config.save(config_path)?;

    Clinic::open(config.clone())?.close()?;

    write_response(json!({
        "initialized": true,
        "config": config_path.display().to_string(),
        "data_dir": config.data_dir,
    }))
}

/// Serves JSON requests from stdin until EOF, then closes the clinic.
pub fn start(config_path: &Path) -> CliResult<()> {
    let mut clinic = open_clinic(config_path)?;

    {
        let mut handler = ApiHandler::new(&mut clinic);
        for line in read_requests() {
            match line {
                Ok(request) => write_json(&handler.handle(&request).to_json())?,
                Err(e) => {
                    write_error(e.code_str(), e.message())?;
                    break;
                }
            }
        }
    }

    clinic.close()?;
    Ok(())
}

/// Runs one SELECT, prints the response, and closes the clinic.
pub fn query(config_path: &Path, sql: &str) -> CliResult<()> {
    let clinic = open_clinic(config_path)?;

    let response = match run_select(&clinic, sql) {
        Ok(rows) => Response::success(Value::Array(rows)),
        Err(e) => Response::error(&e),
    };
    write_json(&response.to_json())?;

    clinic.close()?;
    Ok(())
}

fn run_select(clinic: &Clinic, sql: &str) -> Result<Vec<Value>, ApiError> {
    let parsed = Query::parse(sql)?;
    Ok(query::execute(clinic, &parsed)?)
}

fn open_clinic(config_path: &Path) -> CliResult<Clinic> {
    let config = ClinicConfig::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);

    if !config.data_path().is_dir() {
        return Err(CliError::not_initialized(config.data_path()));
    }
    Ok(Clinic::open(config)?)
}
