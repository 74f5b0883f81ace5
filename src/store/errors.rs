//! Record store error taxonomy
//!
//! Error codes:
//! - CLINIC_DUPLICATE_KEY (ERROR)
//! - CLINIC_NOT_FOUND (ERROR)
//! - CLINIC_FOREIGN_KEY_MISSING (ERROR)
//! - CLINIC_RECORD_TOO_LARGE (ERROR)
//! - CLINIC_INVALID_FIELD (ERROR)
//! - CLINIC_IO_FAILURE (ERROR)
//! - CLINIC_MALFORMED_RECORD (FATAL) - index points at an unreadable frame
//!
//! Every error is returned to the caller; none terminates the process.

use std::error::Error as StdError;
use std::fmt;

use crate::snapshot::SnapshotError;
use crate::storage::{StorageError, StorageErrorCode};

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller or environment error; the store is still consistent
    Error,
    /// Index and data file disagree
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

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Insert with a key that is already live
    DuplicateKey,
    /// Lookup, update, or delete of an absent key
    NotFound,
    /// Appointment references a doctor that is not live
    ForeignKeyMissing,
    /// Frame at an indexed offset could not be parsed
    MalformedRecord,
    /// File could not be opened, read, or written
    IoFailure,
    /// Updated record does not fit its slot
    RecordTooLarge,
    /// Field value cannot be stored in the frame or snapshot formats
    InvalidField,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::DuplicateKey => "CLINIC_DUPLICATE_KEY",
            StoreErrorCode::NotFound => "CLINIC_NOT_FOUND",
            StoreErrorCode::ForeignKeyMissing => "CLINIC_FOREIGN_KEY_MISSING",
            StoreErrorCode::MalformedRecord => "CLINIC_MALFORMED_RECORD",
            StoreErrorCode::IoFailure => "CLINIC_IO_FAILURE",
            StoreErrorCode::RecordTooLarge => "CLINIC_RECORD_TOO_LARGE",
            StoreErrorCode::InvalidField => "CLINIC_INVALID_FIELD",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::MalformedRecord => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with code, message, and optional context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Insert of a key that is already live
    pub fn duplicate_key(kind: &str, key: &str) -> Self {
        Self::new(
            StoreErrorCode::DuplicateKey,
            format!("{} '{}' already exists", kind, key),
        )
    }

    /// Key not present in the primary index
    pub fn not_found(kind: &str, key: &str) -> Self {
        Self::new(
            StoreErrorCode::NotFound,
            format!("{} '{}' not found", kind, key),
        )
    }

    /// Referenced doctor is not live
    pub fn foreign_key_missing(doctor_id: &str) -> Self {
        Self::new(
            StoreErrorCode::ForeignKeyMissing,
            format!("doctor '{}' does not exist", doctor_id),
        )
    }

    /// Frame at `offset` could not be read as the expected record
    pub fn malformed(key: &str, offset: u64, reason: impl Into<String>) -> Self {
        Self {
            details: Some(format!("key: {}, byte_offset: {}", key, offset)),
            ..Self::new(StoreErrorCode::MalformedRecord, reason)
        }
    }

    /// Updated frame would overrun its slot
    pub fn record_too_large(key: &str, needed: u64, available: u64) -> Self {
        Self {
            details: Some(format!("needed: {}, available: {}", needed, available)),
            ..Self::new(
                StoreErrorCode::RecordTooLarge,
                format!("updated record '{}' does not fit its slot", key),
            )
        }
    }

    /// Field cannot be represented
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        Self {
            details: Some(format!("field: {}", field)),
            ..Self::new(StoreErrorCode::InvalidField, reason)
        }
    }

    /// Wraps a lower-level failure as an I/O failure
    pub fn io_failure(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(StoreErrorCode::IoFailure, message)
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
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

    /// Returns whether this error signals internal corruption
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StoreError {
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
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err.code() {
            StorageErrorCode::ClinicMalformedRecord => Self {
                details: err.offset().map(|o| format!("byte_offset: {}", o)),
                ..Self::new(StoreErrorCode::MalformedRecord, err.message().to_string())
            },
            StorageErrorCode::ClinicStorageIo => {
                Self::io_failure("data file operation failed", err)
            }
        }
    }
}

impl From<SnapshotError> for StoreError {
    fn from(err: SnapshotError) -> Self {
        Self::io_failure("index snapshot operation failed", err)
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreErrorCode::DuplicateKey.code(), "CLINIC_DUPLICATE_KEY");
        assert_eq!(StoreErrorCode::NotFound.code(), "CLINIC_NOT_FOUND");
        assert_eq!(
            StoreErrorCode::ForeignKeyMissing.code(),
            "CLINIC_FOREIGN_KEY_MISSING"
        );
        assert_eq!(StoreErrorCode::MalformedRecord.code(), "CLINIC_MALFORMED_RECORD");
        assert_eq!(StoreErrorCode::IoFailure.code(), "CLINIC_IO_FAILURE");
        assert_eq!(StoreErrorCode::RecordTooLarge.code(), "CLINIC_RECORD_TOO_LARGE");
        assert_eq!(StoreErrorCode::InvalidField.code(), "CLINIC_INVALID_FIELD");
    }

    #[test]
    fn test_only_malformed_is_fatal() {
        assert!(StoreError::malformed("D1", 0, "bad frame").is_fatal());
        assert!(!StoreError::not_found("doctor", "D1").is_fatal());
        assert!(!StoreError::duplicate_key("doctor", "D1").is_fatal());
        assert!(!StoreError::foreign_key_missing("D9").is_fatal());
    }

    #[test]
    fn test_storage_malformed_maps_to_malformed() {
        let err: StoreError = StorageError::malformed_at_offset(12, "Unreadable frame").into();
        assert_eq!(err.code(), StoreErrorCode::MalformedRecord);
        assert_eq!(err.details(), Some("byte_offset: 12"));
    }

    #[test]
    fn test_storage_io_maps_to_io_failure() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = StorageError::io_error("open failed", io).into();
        assert_eq!(err.code(), StoreErrorCode::IoFailure);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_display_contains_details() {
        let err = StoreError::record_too_large("D1", 40, 32);
        let display = err.to_string();
        assert!(display.contains("CLINIC_RECORD_TOO_LARGE"));
        assert!(display.contains("needed: 40"));
    }
}
