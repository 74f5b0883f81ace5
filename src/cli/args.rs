//! CLI argument definitions using clap
//!
//! Commands:
//! - clinicdb init --config <path> [--data-dir <dir>]
//! - clinicdb start --config <path>
//! - clinicdb query --config <path> "<SELECT ...>"

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::clinic::DEFAULT_CONFIG_PATH;

/// clinicdb - doctor and appointment records in indexed flat files
#[derive(Parser, Debug)]
#[command(name = "clinicdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a config file and create an empty data directory
    Init {
        /// Path of the configuration file to create
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Data directory recorded in the new config
        #[arg(long, default_value = "./clinic-data")]
        data_dir: String,
    },

    /// Serve JSON requests from stdin, one per line, until EOF
    Start {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Run a single SELECT and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// e.g. "SELECT * FROM doctors WHERE name = 'Alice'"
        sql: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
