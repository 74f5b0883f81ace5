//! JSON request/response layer for clinicdb
//!
//! Error codes from the store and query layers are passed through
//! unchanged. Requests are handled one at a time against a single clinic.
//!
//! # Supported Operations
//!
//! - insert_doctor, insert_appointment
//! - find_doctor, find_doctors_by_name
//! - find_appointment, find_appointments_by_doctor
//! - delete_doctor, delete_appointment
//! - rename_doctor, change_doctor_address, reschedule_appointment
//! - query
//! - stats

mod errors;
mod handler;
mod request;
mod response;

pub use errors::{ApiError, ApiErrorCode, ApiResult, Severity};
pub use handler::ApiHandler;
pub use request::Request;
pub use response::{ErrorResponse, Response, SuccessResponse};
