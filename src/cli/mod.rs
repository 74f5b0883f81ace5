//! CLI module for clinicdb
//!
//! - init: write a config file and an empty data directory
//! - start: serve JSON requests from stdin until EOF
//! - query: run one SELECT and exit

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, query, run, run_command, start};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error, write_json, write_response};
