//! API error types
//!
//! API errors are pass-through: store and query errors keep their own
//! codes. Only request-shape problems get API codes.
//!
//! - CLINIC_INVALID_REQUEST (ERROR)
//! - CLINIC_UNKNOWN_OPERATION (ERROR)

use std::fmt;

use crate::query::QueryError;
use crate::store::StoreError;

/// API error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    /// Passed through from a corruption error
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

/// API-level error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Request is not valid JSON or misses a field
    InvalidRequest,
    /// `op` names no known operation
    UnknownOperation,
}

impl ApiErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidRequest => "CLINIC_INVALID_REQUEST",
            ApiErrorCode::UnknownOperation => "CLINIC_UNKNOWN_OPERATION",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error carrying the originating subsystem's code
#[derive(Debug)]
pub struct ApiError {
    code: String,
    message: String,
    severity: Severity,
}

impl ApiError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::InvalidRequest.code().to_string(),
            message: reason.into(),
            severity: Severity::Error,
        }
    }

    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self {
            code: ApiErrorCode::UnknownOperation.code().to_string(),
            message: format!("Unknown operation: {}", op.into()),
            severity: Severity::Error,
        }
    }

    /// Original error code string
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let message = match err.details() {
            Some(details) => format!("{} ({})", err.message(), details),
            None => err.message().to_string(),
        };
        Self {
            code: err.code().code().to_string(),
            message,
            severity: if err.is_fatal() {
                Severity::Fatal
            } else {
                Severity::Error
            },
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Store(store) => store.into(),
            other => Self {
                code: other.code().to_string(),
                message: other.to_string(),
                severity: Severity::Error,
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_codes_pass_through() {
        let err: ApiError = StoreError::duplicate_key("doctor", "D1").into();
        assert_eq!(err.code(), "CLINIC_DUPLICATE_KEY");
        assert!(!err.is_fatal());

        let err: ApiError = StoreError::malformed("D1", 7, "bad frame").into();
        assert_eq!(err.code(), "CLINIC_MALFORMED_RECORD");
        assert!(err.is_fatal());
        assert!(err.message().contains("byte_offset: 7"));
    }

    #[test]
    fn test_query_codes_pass_through() {
        let err: ApiError = QueryError::Syntax.into();
        assert_eq!(err.code(), "CLINIC_QUERY_SYNTAX");

        let err: ApiError = QueryError::Store(StoreError::not_found("doctor", "D1")).into();
        assert_eq!(err.code(), "CLINIC_NOT_FOUND");
    }

    #[test]
    fn test_display() {
        let err = ApiError::unknown_operation("explode");
        assert_eq!(
            err.to_string(),
            "[ERROR] CLINIC_UNKNOWN_OPERATION: Unknown operation: explode"
        );
    }
}
