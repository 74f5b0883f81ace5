//! Maps a parsed query onto a single clinic lookup
//!
//! | table        | filter    | operation                     |
//! |--------------|-----------|-------------------------------|
//! | doctors      | id        | `find_doctor_by_id`           |
//! | doctors      | name      | `find_doctors_by_name`        |
//! | appointments | id        | `find_appointment_by_id`      |
//! | appointments | doctor_id | `find_appointments_by_doctor` |
//!
//! A by-id lookup that finds nothing yields an empty result rather than an
//! error.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::clinic::Clinic;
use crate::observability::{Event, Logger};
use crate::store::{StoreError, StoreErrorCode, StoreResult};

use super::ast::{Projection, Query, Table};
use super::errors::{QueryError, QueryResult};

/// Runs `query` and returns one JSON object per matching record.
pub fn execute(clinic: &Clinic, query: &Query) -> QueryResult<Vec<Value>> {
    let value = query.filter.value.as_str();
    let (operation, records) = match (query.table, query.filter.field.as_str()) {
        (Table::Doctors, "id") => (
            "find_doctor_by_id",
            to_values(by_id(clinic.find_doctor_by_id(value)))?,
        ),
        (Table::Doctors, "name") => (
            "find_doctors_by_name",
            to_values(clinic.find_doctors_by_name(value))?,
        ),
        (Table::Appointments, "id") => (
            "find_appointment_by_id",
            to_values(by_id(clinic.find_appointment_by_id(value)))?,
        ),
        (Table::Appointments, "doctor_id") => (
            "find_appointments_by_doctor",
            to_values(clinic.find_appointments_by_doctor(value))?,
        ),
        (table, field) => {
            return Err(QueryError::UnsupportedFilter {
                table: table.name().to_string(),
                field: field.to_string(),
            })
        }
    };

    Logger::trace(
        Event::QueryTranslated,
        &[
            ("table", query.table.name()),
            ("operation", operation),
            ("rows", records.len().to_string().as_str()),
        ],
    );

    Ok(records
        .into_iter()
        .map(|record| project(record, &query.projection))
        .collect())
}

/// A missing key is an empty result, not an error.
fn by_id<R>(result: StoreResult<R>) -> StoreResult<Vec<R>> {
    match result {
        Ok(record) => Ok(vec![record]),
        Err(e) if e.code() == StoreErrorCode::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn to_values<R: Serialize>(result: StoreResult<Vec<R>>) -> QueryResult<Vec<Value>> {
    result?
        .iter()
        .map(|record| {
            serde_json::to_value(record).map_err(|e| {
                QueryError::Store(StoreError::io_failure("Failed to encode record", e))
            })
        })
        .collect()
}

fn project(record: Value, projection: &Projection) -> Value {
    match projection {
        Projection::All => record,
        Projection::Field(field) => {
            let mut out = Map::new();
            if let Some(v) = record.get(field) {
                out.insert(field.clone(), v.clone());
            }
            Value::Object(out)
        }
    }
}
