//! CLI error types
//!
//! A CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::clinic::ConfigError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing, unreadable, or invalid
    ConfigError,
    /// stdin/stdout failure
    IoError,
    /// Config file already exists
    AlreadyInitialized,
    /// Data directory does not exist
    NotInitialized,
    /// Clinic could not be opened or closed
    BootFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CLINIC_CLI_CONFIG_ERROR",
            Self::IoError => "CLINIC_CLI_IO_ERROR",
            Self::AlreadyInitialized => "CLINIC_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "CLINIC_CLI_NOT_INITIALIZED",
            Self::BootFailed => "CLINIC_CLI_BOOT_FAILED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized(path: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("Config file {} already exists", path.display()),
        )
    }

    pub fn not_initialized(data_dir: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!(
                "Data directory {} does not exist. Run 'clinicdb init' first.",
                data_dir.display()
            ),
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::boot_failed(e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;
