//! Record shapes stored by clinicdb
//!
//! A record is a key plus an ordered list of string fields. Each shape
//! names the attribute that drives its secondary index.

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};

/// A record shape that a [`RecordStore`](super::RecordStore) can hold.
pub trait Record: Clone {
    /// Entity kind, used in messages, logs, and file names
    const KIND: &'static str;

    /// Primary key
    fn key(&self) -> &str;

    /// Value of the secondary-indexed attribute
    fn indexed_value(&self) -> &str;

    /// Fields in on-disk order
    fn to_fields(&self) -> Vec<String>;

    /// Rebuilds a record from decoded fields; `None` if the shape is wrong
    fn from_fields(fields: Vec<String>) -> Option<Self>;

    /// Checks that every field can be framed and snapshotted.
    fn validate(&self) -> StoreResult<()>;
}

/// A doctor: `id|name|address|`, indexed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub address: String,
}

impl Doctor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
        }
    }
}

impl Record for Doctor {
    const KIND: &'static str = "doctor";

    fn key(&self) -> &str {
        &self.id
    }

    fn indexed_value(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone(), self.address.clone()]
    }

    fn from_fields(fields: Vec<String>) -> Option<Self> {
        let [id, name, address]: [String; 3] = fields.try_into().ok()?;
        Some(Self { id, name, address })
    }

    fn validate(&self) -> StoreResult<()> {
        validate_key("id", &self.id)?;
        validate_indexed("name", &self.name)?;
        validate_value("address", &self.address)
    }
}

/// An appointment: `id|date|doctorId|`, indexed by doctor id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub date: String,
    pub doctor_id: String,
}

impl Appointment {
    pub fn new(id: impl Into<String>, date: impl Into<String>, doctor_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            doctor_id: doctor_id.into(),
        }
    }
}

impl Record for Appointment {
    const KIND: &'static str = "appointment";

    fn key(&self) -> &str {
        &self.id
    }

    fn indexed_value(&self) -> &str {
        &self.doctor_id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![self.id.clone(), self.date.clone(), self.doctor_id.clone()]
    }

    fn from_fields(fields: Vec<String>) -> Option<Self> {
        let [id, date, doctor_id]: [String; 3] = fields.try_into().ok()?;
        Some(Self { id, date, doctor_id })
    }

    fn validate(&self) -> StoreResult<()> {
        validate_key("id", &self.id)?;
        validate_value("date", &self.date)?;
        validate_key("doctor_id", &self.doctor_id)
    }
}

/// Keys appear bare in snapshot lines, so no whitespace.
fn validate_key(field: &str, value: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::invalid_field(field, "key must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(StoreError::invalid_field(field, "key must not contain whitespace"));
    }
    validate_value(field, value)
}

fn validate_indexed(field: &str, value: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::invalid_field(field, "indexed value must not be empty"));
    }
    validate_value(field, value)
}

fn validate_value(field: &str, value: &str) -> StoreResult<()> {
    if value.contains(['|', '\n', '\r']) {
        return Err(StoreError::invalid_field(
            field,
            "value must not contain '|' or line breaks",
        ));
    }
    Ok(())
}
