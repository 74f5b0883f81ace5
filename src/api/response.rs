//! API response types
//!
//! `{"status":"ok","data":...}` or
//! `{"status":"error","code":...,"message":...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub status: String,
    pub data: Value,
}

impl SuccessResponse {
    pub fn new(data: Value) -> Self {
        Self {
            status: "ok".to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            status: "error".to_string(),
            code: err.code().to_string(),
            message: err.message().to_string(),
        }
    }
}

/// Unified response type
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success(SuccessResponse::new(data))
    }

    /// Success with `data: null`
    pub fn ok() -> Self {
        Self::success(Value::Null)
    }

    pub fn error(err: &ApiError) -> Self {
        Response::Error(ErrorResponse::from_error(err))
    }

    /// Single-line JSON encoding
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => format!(
                r#"{{"status":"error","code":"CLINIC_INVALID_REQUEST","message":"response encoding failed: {}"}}"#,
                e
            ),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }
}
