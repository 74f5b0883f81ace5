//! API request types
//!
//! One JSON object per request, selected by `op`:
//!
//! ```json
//! {"op": "insert_doctor", "id": "D1", "name": "Alice", "address": "12 Oak St"}
//! {"op": "insert_appointment", "id": "A1", "doctor_id": "D1", "date": "2024-01-01"}
//! {"op": "rename_doctor", "id": "D1", "name": "Alma"}
//! {"op": "query", "sql": "SELECT * FROM doctors WHERE id = 'D1'"}
//! {"op": "stats"}
//! ```

use serde::Deserialize;

use super::errors::{ApiError, ApiResult};

/// Parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    InsertDoctor { id: String, name: String, address: String },
    InsertAppointment { id: String, doctor_id: String, date: String },
    FindDoctor { id: String },
    FindDoctorsByName { name: String },
    DeleteDoctor { id: String },
    FindAppointment { id: String },
    FindAppointmentsByDoctor { doctor_id: String },
    DeleteAppointment { id: String },
    RenameDoctor { id: String, name: String },
    RescheduleAppointment { id: String, date: String },
    ChangeDoctorAddress { id: String, address: String },
    Query { sql: String },
    Stats,
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    op: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    doctor_id: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    sql: Option<String>,
}

impl Request {
    /// Parses a request from one JSON line
    pub fn parse(json: &str) -> ApiResult<Self> {
        let raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e)))?;

        let request = match raw.op.as_str() {
            "insert_doctor" => Request::InsertDoctor {
                id: require(raw.id, "id")?,
                name: require(raw.name, "name")?,
                address: require(raw.address, "address")?,
            },
            "insert_appointment" => Request::InsertAppointment {
                id: require(raw.id, "id")?,
                doctor_id: require(raw.doctor_id, "doctor_id")?,
                date: require(raw.date, "date")?,
            },
            "find_doctor" => Request::FindDoctor {
                id: require(raw.id, "id")?,
            },
            "find_doctors_by_name" => Request::FindDoctorsByName {
                name: require(raw.name, "name")?,
            },
            "delete_doctor" => Request::DeleteDoctor {
                id: require(raw.id, "id")?,
            },
            "find_appointment" => Request::FindAppointment {
                id: require(raw.id, "id")?,
            },
            "find_appointments_by_doctor" => Request::FindAppointmentsByDoctor {
                doctor_id: require(raw.doctor_id, "doctor_id")?,
            },
            "delete_appointment" => Request::DeleteAppointment {
                id: require(raw.id, "id")?,
            },
            "rename_doctor" => Request::RenameDoctor {
                id: require(raw.id, "id")?,
                name: require(raw.name, "name")?,
            },
            "reschedule_appointment" => Request::RescheduleAppointment {
                id: require(raw.id, "id")?,
                date: require(raw.date, "date")?,
            },
            "change_doctor_address" => Request::ChangeDoctorAddress {
                id: require(raw.id, "id")?,
                address: require(raw.address, "address")?,
            },
            "query" => Request::Query {
                sql: require(raw.sql, "sql")?,
            },
            "stats" => Request::Stats,
            other => return Err(ApiError::unknown_operation(other)),
        };
        Ok(request)
    }
}

fn require(value: Option<String>, field: &str) -> ApiResult<String> {
    value.ok_or_else(|| ApiError::invalid_request(format!("Missing {}", field)))
}
