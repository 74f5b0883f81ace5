//! API handler for clinicdb
//!
//! Parses one request, runs it against the clinic, and turns the outcome
//! into a response. Errors never escape as panics or early exits.

use serde::Serialize;
use serde_json::{json, Value};

use crate::clinic::Clinic;
use crate::query::{self, Query};

use super::errors::{ApiError, ApiResult};
use super::request::Request;
use super::response::Response;

/// Dispatches JSON requests onto a borrowed clinic
pub struct ApiHandler<'a> {
    clinic: &'a mut Clinic,
}

impl<'a> ApiHandler<'a> {
    pub fn new(clinic: &'a mut Clinic) -> Self {
        Self { clinic }
    }

    /// Handles one raw JSON request string
    pub fn handle(&mut self, json_request: &str) -> Response {
        let request = match Request::parse(json_request) {
            Ok(r) => r,
            Err(e) => return Response::error(&e),
        };

        match self.dispatch(request) {
            Ok(data) => Response::success(data),
            Err(e) => Response::error(&e),
        }
    }

    fn dispatch(&mut self, request: Request) -> ApiResult<Value> {
        let clinic = &mut *self.clinic;
        match request {
            Request::InsertDoctor { id, name, address } => {
                let offset = clinic.insert_doctor(&id, &name, &address)?;
                Ok(json!({ "id": id, "offset": offset }))
            }
            Request::InsertAppointment { id, doctor_id, date } => {
                let offset = clinic.insert_appointment(&id, &doctor_id, &date)?;
                Ok(json!({ "id": id, "offset": offset }))
            }
            Request::FindDoctor { id } => to_data(&clinic.find_doctor_by_id(&id)?),
            Request::FindDoctorsByName { name } => to_data(&clinic.find_doctors_by_name(&name)?),
            Request::DeleteDoctor { id } => {
                clinic.delete_doctor(&id)?;
                Ok(Value::Null)
            }
            Request::FindAppointment { id } => to_data(&clinic.find_appointment_by_id(&id)?),
            Request::FindAppointmentsByDoctor { doctor_id } => {
                to_data(&clinic.find_appointments_by_doctor(&doctor_id)?)
            }
            Request::DeleteAppointment { id } => {
                clinic.delete_appointment(&id)?;
                Ok(Value::Null)
            }
            Request::RenameDoctor { id, name } => to_data(&clinic.rename_doctor(&id, &name)?),
            Request::RescheduleAppointment { id, date } => {
                to_data(&clinic.reschedule_appointment(&id, &date)?)
            }
            Request::ChangeDoctorAddress { id, address } => {
                to_data(&clinic.change_doctor_address(&id, &address)?)
            }
            Request::Query { sql } => {
                let parsed = Query::parse(&sql)?;
                Ok(Value::Array(query::execute(clinic, &parsed)?))
            }
            Request::Stats => to_data(&clinic.stats()),
        }
    }
}

fn to_data<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::invalid_request(format!("Failed to encode response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinic::{ClinicConfig, FlushPolicy};
    use tempfile::TempDir;

    fn clinic(temp_dir: &TempDir) -> Clinic {
        let config = ClinicConfig::new(temp_dir.path().display().to_string())
            .with_flush_policy(FlushPolicy::OnClose);
        Clinic::open(config).unwrap()
    }

    fn call(handler: &mut ApiHandler<'_>, request: &str) -> Value {
        serde_json::from_str(&handler.handle(request).to_json()).unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let temp_dir = TempDir::new().unwrap();
        let mut clinic = clinic(&temp_dir);
        let mut handler = ApiHandler::new(&mut clinic);

        let resp = call(
            &mut handler,
            r#"{"op":"insert_doctor","id":"D1","name":"Alice","address":"12 Oak St"}"#,
        );
        assert_eq!(resp, json!({"status": "ok", "data": {"id": "D1", "offset": 0}}));

        let resp = call(&mut handler, r#"{"op":"find_doctor","id":"D1"}"#);
        assert_eq!(resp["data"]["name"], "Alice");
    }

    #[test]
    fn test_store_error_code_passed_through() {
        let temp_dir = TempDir::new().unwrap();
        let mut clinic = clinic(&temp_dir);
        let mut handler = ApiHandler::new(&mut clinic);

        let resp = call(
            &mut handler,
            r#"{"op":"insert_appointment","id":"A1","doctor_id":"D9","date":"2024-01-01"}"#,
        );
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["code"], "CLINIC_FOREIGN_KEY_MISSING");

        let resp = call(&mut handler, r#"{"op":"delete_doctor","id":"D1"}"#);
        assert_eq!(resp["code"], "CLINIC_NOT_FOUND");
    }

    #[test]
    fn test_query_and_stats() {
        let temp_dir = TempDir::new().unwrap();
        let mut clinic = clinic(&temp_dir);
        let mut handler = ApiHandler::new(&mut clinic);

        call(
            &mut handler,
            r#"{"op":"insert_doctor","id":"D1","name":"Alice","address":"12 Oak St"}"#,
        );
        let resp = call(
            &mut handler,
            r#"{"op":"query","sql":"SELECT name FROM doctors WHERE id = 'D1'"}"#,
        );
        assert_eq!(resp["data"], json!([{"name": "Alice"}]));

        let resp = call(&mut handler, r#"{"op":"query","sql":"SELECT nonsense"}"#);
        assert_eq!(resp["code"], "CLINIC_QUERY_SYNTAX");

        let resp = call(&mut handler, r#"{"op":"stats"}"#);
        assert_eq!(resp["data"]["doctors"]["live_records"], 1);
    }
}
