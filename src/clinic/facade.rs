//! The clinic: a doctor store and an appointment store sharing one data
//! directory and one snapshot gateway.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::index::StorageOffset;
use crate::observability::{Event, Logger};
use crate::snapshot::SnapshotGateway;
use crate::store::{Appointment, Doctor, Record, RecordStore, StoreError, StoreResult, StoreStats};

use super::config::{ClinicConfig, FlushPolicy};

/// Table name for doctors, used for data and snapshot file names
pub const DOCTORS_TABLE: &str = "doctors";

/// Table name for appointments
pub const APPOINTMENTS_TABLE: &str = "appointments";

/// Occupancy of both stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClinicStats {
    pub doctors: StoreStats,
    pub appointments: StoreStats,
}

/// Open clinic session
pub struct Clinic {
    config: ClinicConfig,
    gateway: SnapshotGateway,
    doctors: RecordStore<Doctor>,
    appointments: RecordStore<Appointment>,
    /// Committed mutations not yet covered by a successful flush
    unflushed: bool,
}

impl Clinic {
    /// Opens the data directory, creating it if needed, and loads the
    /// index snapshots for both stores.
    pub fn open(config: ClinicConfig) -> StoreResult<Self> {
        let data_dir = config.data_path().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|e| {
            StoreError::io_failure(
                format!("Failed to create data directory {}", data_dir.display()),
                e,
            )
        })?;

        let doctors_path = data_file_path(&data_dir, DOCTORS_TABLE);
        let appointments_path = data_file_path(&data_dir, APPOINTMENTS_TABLE);

        let gateway = SnapshotGateway::new(&data_dir);
        let mut sets = gateway
            .load(&[
                (DOCTORS_TABLE, existing_len(&doctors_path)?),
                (APPOINTMENTS_TABLE, existing_len(&appointments_path)?),
            ])?
            .into_iter();
        let doctor_indexes = sets.next().unwrap_or_default();
        let appointment_indexes = sets.next().unwrap_or_default();

        let doctors = RecordStore::open(&doctors_path, doctor_indexes)?;
        let appointments = RecordStore::open(&appointments_path, appointment_indexes)?;

        Logger::info(
            Event::SessionStart,
            &[
                ("data_dir", data_dir.display().to_string().as_str()),
                ("doctors", doctors.stats().live_records.to_string().as_str()),
                (
                    "appointments",
                    appointments.stats().live_records.to_string().as_str(),
                ),
            ],
        );

        Ok(Self {
            config,
            gateway,
            doctors,
            appointments,
            unflushed: false,
        })
    }

    pub fn config(&self) -> &ClinicConfig {
        &self.config
    }

    /// Inserts a doctor, returning the frame offset.
    pub fn insert_doctor(&mut self, id: &str, name: &str, address: &str) -> StoreResult<StorageOffset> {
        let offset = self.doctors.insert(&Doctor::new(id, name, address))?;
        self.after_mutation();
        Ok(offset)
    }

    /// Inserts an appointment for a live doctor, returning the frame offset.
    pub fn insert_appointment(
        &mut self,
        id: &str,
        doctor_id: &str,
        date: &str,
    ) -> StoreResult<StorageOffset> {
        let appointment = Appointment::new(id, date, doctor_id);
        appointment.validate()?;

        if !self.doctors.contains(doctor_id) {
            Logger::warn(
                Event::ForeignKeyRejected,
                &[("appointment", id), ("doctor_id", doctor_id)],
            );
            return Err(StoreError::foreign_key_missing(doctor_id));
        }

        let offset = self.appointments.insert(&appointment)?;
        self.after_mutation();
        Ok(offset)
    }

    pub fn find_doctor_by_id(&self, id: &str) -> StoreResult<Doctor> {
        self.doctors.get(id)
    }

    /// Doctors with exactly this name, in insertion order
    pub fn find_doctors_by_name(&self, name: &str) -> StoreResult<Vec<Doctor>> {
        self.doctors.find_by_attribute(name)
    }

    /// Deletes a doctor. Appointments referencing it are left in place.
    pub fn delete_doctor(&mut self, id: &str) -> StoreResult<()> {
        self.doctors.delete(id)?;
        self.after_mutation();
        Ok(())
    }

    pub fn find_appointment_by_id(&self, id: &str) -> StoreResult<Appointment> {
        self.appointments.get(id)
    }

    pub fn find_appointments_by_doctor(&self, doctor_id: &str) -> StoreResult<Vec<Appointment>> {
        self.appointments.find_by_attribute(doctor_id)
    }

    pub fn delete_appointment(&mut self, id: &str) -> StoreResult<()> {
        self.appointments.delete(id)?;
        self.after_mutation();
        Ok(())
    }

    /// Changes a doctor's name; the name index follows.
    pub fn rename_doctor(&mut self, id: &str, new_name: &str) -> StoreResult<Doctor> {
        let doctor = self
            .doctors
            .update(id, |d| d.name = new_name.to_string())?;
        self.after_mutation();
        Ok(doctor)
    }

    pub fn change_doctor_address(&mut self, id: &str, new_address: &str) -> StoreResult<Doctor> {
        let doctor = self
            .doctors
            .update(id, |d| d.address = new_address.to_string())?;
        self.after_mutation();
        Ok(doctor)
    }

    pub fn reschedule_appointment(&mut self, id: &str, new_date: &str) -> StoreResult<Appointment> {
        let appointment = self
            .appointments
            .update(id, |a| a.date = new_date.to_string())?;
        self.after_mutation();
        Ok(appointment)
    }

    pub fn stats(&self) -> ClinicStats {
        ClinicStats {
            doctors: self.doctors.stats(),
            appointments: self.appointments.stats(),
        }
    }

    /// Syncs both data files, then writes every index snapshot and the
    /// manifest.
    pub fn flush(&mut self) -> StoreResult<()> {
        self.doctors.sync()?;
        self.appointments.sync()?;
        self.gateway.save(&[
            (DOCTORS_TABLE, self.doctors.indexes()),
            (APPOINTMENTS_TABLE, self.appointments.indexes()),
        ])?;
        self.unflushed = false;
        Ok(())
    }

    /// True when a committed mutation has not reached the snapshots yet,
    /// either by policy or because its flush failed.
    pub fn has_unflushed_changes(&self) -> bool {
        self.unflushed
    }

    /// Flushes and ends the session.
    pub fn close(mut self) -> StoreResult<()> {
        self.flush()?;

        let stats = self.stats();
        Logger::info(
            Event::SessionEnd,
            &[
                ("doctors", stats.doctors.live_records.to_string().as_str()),
                (
                    "appointments",
                    stats.appointments.live_records.to_string().as_str(),
                ),
            ],
        );
        Ok(())
    }

    /// Runs once the store has committed a mutation. A flush failure here
    /// does not undo the mutation: it is logged, the changes stay pending,
    /// and the next `flush` or `close` retries and reports it.
    fn after_mutation(&mut self) {
        self.unflushed = true;
        if self.config.flush_policy == FlushPolicy::OnClose {
            return;
        }

        if let Err(e) = self.flush() {
            Logger::error(
                Event::FlushDeferred,
                &[
                    ("code", e.code().code()),
                    ("message", e.message()),
                    ("details", e.details().unwrap_or("")),
                ],
            );
        }
    }
}

/// `<data_dir>/<table>.dat`
pub fn data_file_path(data_dir: &Path, table: &str) -> PathBuf {
    data_dir.join(format!("{}.dat", table))
}

/// Length of a data file, 0 if it does not exist yet
fn existing_len(path: &Path) -> StoreResult<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(StoreError::io_failure(
            format!("Failed to stat {}", path.display()),
            e,
        )),
    }
}
