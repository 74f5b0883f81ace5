//! Index snapshot error types
//!
//! Error codes:
//! - CLINIC_SNAPSHOT_IO (ERROR) - snapshot file could not be read or written
//! - CLINIC_SNAPSHOT_PARSE (ERROR) - a snapshot line is malformed
//! - CLINIC_SNAPSHOT_CHECKSUM (ERROR) - file does not match its manifest entry
//! - CLINIC_SNAPSHOT_MANIFEST (ERROR) - manifest missing an entry or unreadable

use std::fmt;
use std::io;
use std::path::Path;

/// Severity levels for snapshot errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Session cannot start or save; existing files are left untouched
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Snapshot error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotErrorCode {
    ClinicSnapshotIo,
    ClinicSnapshotParse,
    ClinicSnapshotChecksum,
    ClinicSnapshotManifest,
}

impl SnapshotErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SnapshotErrorCode::ClinicSnapshotIo => "CLINIC_SNAPSHOT_IO",
            SnapshotErrorCode::ClinicSnapshotParse => "CLINIC_SNAPSHOT_PARSE",
            SnapshotErrorCode::ClinicSnapshotChecksum => "CLINIC_SNAPSHOT_CHECKSUM",
            SnapshotErrorCode::ClinicSnapshotManifest => "CLINIC_SNAPSHOT_MANIFEST",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for SnapshotErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Snapshot error with code, message, and optional context
#[derive(Debug)]
pub struct SnapshotError {
    code: SnapshotErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl SnapshotError {
    fn new(code: SnapshotErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// I/O failure with a free-form message
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(SnapshotErrorCode::ClinicSnapshotIo, message)
        }
    }

    /// I/O failure on a specific file
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error at path: {}", path.display()), source)
    }

    /// Malformed line in a snapshot file; `line` is 1-based
    pub fn parse_error(file: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            details: Some(format!("file: {}, line: {}", file, line)),
            ..Self::new(SnapshotErrorCode::ClinicSnapshotParse, message)
        }
    }

    /// File contents do not match the checksum recorded in the manifest
    pub fn checksum_mismatch(file: &str, expected: &str, actual: &str) -> Self {
        Self {
            details: Some(format!("expected: {}, actual: {}", expected, actual)),
            ..Self::new(
                SnapshotErrorCode::ClinicSnapshotChecksum,
                format!("checksum mismatch for {}", file),
            )
        }
    }

    /// Manifest could not be read, written, or is incomplete
    pub fn manifest_error(message: impl Into<String>) -> Self {
        Self::new(SnapshotErrorCode::ClinicSnapshotManifest, message)
    }

    /// Manifest failure caused by an I/O error
    pub fn manifest_io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::manifest_error(message)
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SnapshotErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;
