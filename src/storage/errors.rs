//! Storage error types
//!
//! Error codes:
//! - CLINIC_STORAGE_IO (ERROR severity)
//! - CLINIC_MALFORMED_RECORD (FATAL severity) - index and data file disagree

use std::fmt;
use std::io;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, session continues
    Error,
    /// Internal corruption; reported to the caller, never recovered
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Data file could not be opened, read, or written
    ClinicStorageIo,
    /// Frame at a trusted offset could not be decoded
    ClinicMalformedRecord,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::ClinicStorageIo => "CLINIC_STORAGE_IO",
            StorageErrorCode::ClinicMalformedRecord => "CLINIC_MALFORMED_RECORD",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::ClinicStorageIo => Severity::Error,
            StorageErrorCode::ClinicMalformedRecord => Severity::Fatal,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with code, message, and optional context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    offset: Option<u64>,
    source: Option<io::Error>,
}

impl StorageError {
    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::ClinicStorageIo,
            message: message.into(),
            offset: None,
            source: Some(source),
        }
    }

    /// Create a storage I/O error at a byte offset
    pub fn io_error_at_offset(offset: u64, message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::ClinicStorageIo,
            message: message.into(),
            offset: Some(offset),
            source: Some(source),
        }
    }

    /// Create a malformed-record error with byte offset context
    pub fn malformed_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::ClinicMalformedRecord,
            message: reason.into(),
            offset: Some(offset),
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
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

    /// Returns the byte offset the error refers to, if known
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns whether this error signals corruption
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(offset) = self.offset {
            write!(f, " (byte_offset: {})", offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
