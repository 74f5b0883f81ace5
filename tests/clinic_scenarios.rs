//! Clinic end-to-end scenarios
//!
//! Exercises the public clinic surface against a real data directory:
//! - Insert/lookup round-trip and key uniqueness
//! - Delete visibility and free-space reuse
//! - Secondary index consistency
//! - Foreign key enforcement
//! - Dangling appointments after a doctor is deleted
//! - Persistence across sessions and snapshot integrity

use std::fs;

use clinicdb::clinic::{Clinic, ClinicConfig, FlushPolicy};
use clinicdb::store::{Appointment, Doctor, StoreErrorCode};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn config_for(temp_dir: &TempDir) -> ClinicConfig {
    ClinicConfig::new(temp_dir.path().join("data").display().to_string())
}

fn open(temp_dir: &TempDir) -> Clinic {
    Clinic::open(config_for(temp_dir)).expect("open clinic")
}

fn seed(clinic: &mut Clinic) {
    clinic.insert_doctor("D1", "Alice", "12 Oak St").unwrap();
    clinic.insert_doctor("D2", "Bob", "3 Pine Rd").unwrap();
    clinic.insert_doctor("D3", "Alice", "77 Birch Ave").unwrap();
    clinic.insert_appointment("A1", "D1", "2024-01-01").unwrap();
    clinic.insert_appointment("A2", "D1", "2024-01-08").unwrap();
    clinic.insert_appointment("A3", "D2", "2024-02-01").unwrap();
}

// =============================================================================
// Round-trip and uniqueness
// =============================================================================

#[test]
fn test_insert_then_lookup_returns_fields_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);

    let doctors = [
        Doctor::new("D1", "Alice", "12 Oak St"),
        Doctor::new("D-22", "Dr. Zoë Ng", ""),
        Doctor::new("X", "A", "100% upstairs, room 4"),
    ];
    for doctor in &doctors {
        clinic
            .insert_doctor(&doctor.id, &doctor.name, &doctor.address)
            .unwrap();
    }
    for doctor in &doctors {
        assert_eq!(&clinic.find_doctor_by_id(&doctor.id).unwrap(), doctor);
    }
}

#[test]
fn test_duplicate_key_leaves_original() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);
    clinic.insert_doctor("D1", "Alice", "12 Oak St").unwrap();

    let err = clinic.insert_doctor("D1", "Mallory", "nowhere").unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::DuplicateKey);

    assert_eq!(
        clinic.find_doctor_by_id("D1").unwrap(),
        Doctor::new("D1", "Alice", "12 Oak St")
    );
    assert!(clinic.find_doctors_by_name("Mallory").unwrap().is_empty());
}

// =============================================================================
// Delete and free-space reuse
// =============================================================================

#[test]
fn test_delete_is_not_found_twice() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);
    clinic.insert_doctor("D1", "Alice", "12 Oak St").unwrap();

    clinic.delete_doctor("D1").unwrap();
    assert_eq!(
        clinic.find_doctor_by_id("D1").unwrap_err().code(),
        StoreErrorCode::NotFound
    );
    assert_eq!(
        clinic.delete_doctor("D1").unwrap_err().code(),
        StoreErrorCode::NotFound
    );
}

#[test]
fn test_smaller_insert_reuses_freed_offset() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);

    let freed = clinic.insert_doctor("D1", "Alice", "12 Oak St").unwrap();
    clinic.insert_doctor("D2", "Bob", "3 Pine Rd").unwrap();
    let end_before = clinic.stats().doctors.data_file_bytes;

    clinic.delete_doctor("D1").unwrap();
    let reused = clinic.insert_doctor("D9", "Eve", "1 Elm").unwrap();

    assert_eq!(reused, freed);
    assert_eq!(clinic.stats().doctors.data_file_bytes, end_before);
    assert_eq!(clinic.stats().doctors.free_slots, 0);
    assert_eq!(clinic.find_doctor_by_id("D9").unwrap().name, "Eve");
    assert_eq!(clinic.find_doctor_by_id("D2").unwrap().name, "Bob");
}

#[test]
fn test_larger_insert_appends() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);

    clinic.insert_doctor("D1", "Al", "x").unwrap();
    clinic.insert_doctor("D2", "Bob", "3 Pine Rd").unwrap();
    clinic.delete_doctor("D1").unwrap();

    let end = clinic.stats().doctors.data_file_bytes;
    let offset = clinic
        .insert_doctor("D3", "Bartholomew", "1234 Very Long Street Name")
        .unwrap();
    assert_eq!(offset, end);
    assert_eq!(clinic.stats().doctors.free_slots, 1);
}

// =============================================================================
// Secondary index consistency
// =============================================================================

#[test]
fn test_secondary_index_matches_records() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);
    seed(&mut clinic);
    clinic.rename_doctor("D3", "Carol").unwrap();
    clinic.delete_appointment("A2").unwrap();

    let alices = clinic.find_doctors_by_name("Alice").unwrap();
    assert_eq!(alices, vec![Doctor::new("D1", "Alice", "12 Oak St")]);
    let carols = clinic.find_doctors_by_name("Carol").unwrap();
    assert_eq!(carols.len(), 1);
    assert_eq!(carols[0].id, "D3");

    for doctor_id in ["D1", "D2", "D3"] {
        for appt in clinic.find_appointments_by_doctor(doctor_id).unwrap() {
            assert_eq!(appt.doctor_id, doctor_id);
            assert_eq!(clinic.find_appointment_by_id(&appt.id).unwrap(), appt);
        }
    }
    let ids: Vec<String> = clinic
        .find_appointments_by_doctor("D1")
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec!["A1"]);
}

// =============================================================================
// Foreign keys
// =============================================================================

#[test]
fn test_foreign_key_missing_mutates_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);
    seed(&mut clinic);
    let before = clinic.stats();

    let err = clinic.insert_appointment("A9", "D404", "2024-03-03").unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::ForeignKeyMissing);

    assert_eq!(clinic.stats(), before);
    assert_eq!(
        clinic.find_appointment_by_id("A9").unwrap_err().code(),
        StoreErrorCode::NotFound
    );
    assert!(clinic.find_appointments_by_doctor("D404").unwrap().is_empty());
}

#[test]
fn test_deleted_doctor_leaves_dangling_appointment() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);

    clinic.insert_doctor("D1", "Alice", "12 Oak St").unwrap();
    clinic.insert_appointment("A1", "D1", "2024-01-01").unwrap();
    let ids: Vec<String> = clinic
        .find_appointments_by_doctor("D1")
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec!["A1"]);

    clinic.delete_doctor("D1").unwrap();
    assert_eq!(
        clinic.find_doctor_by_id("D1").unwrap_err().code(),
        StoreErrorCode::NotFound
    );
    assert_eq!(
        clinic.find_appointment_by_id("A1").unwrap(),
        Appointment::new("A1", "2024-01-01", "D1")
    );

    // The reference is only checked at insert time.
    let err = clinic.insert_appointment("A2", "D1", "2024-01-02").unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::ForeignKeyMissing);
}

// =============================================================================
// Updates
// =============================================================================

#[test]
fn test_update_that_overruns_slot_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);
    clinic.insert_doctor("D1", "Al", "x").unwrap();
    clinic.insert_doctor("D2", "Bob", "3 Pine Rd").unwrap();

    let err = clinic
        .rename_doctor("D1", "Alexandra the Magnificent")
        .unwrap_err();
    assert_eq!(err.code(), StoreErrorCode::RecordTooLarge);

    assert_eq!(clinic.find_doctor_by_id("D1").unwrap().name, "Al");
    assert_eq!(clinic.find_doctor_by_id("D2").unwrap().name, "Bob");
    assert_eq!(clinic.find_doctors_by_name("Al").unwrap().len(), 1);
}

#[test]
fn test_shorter_update_then_restore_fits() {
    let temp_dir = TempDir::new().unwrap();
    let mut clinic = open(&temp_dir);
    clinic.insert_doctor("D1", "Alice", "12 Oak St").unwrap();
    clinic.insert_doctor("D2", "Bob", "3 Pine Rd").unwrap();

    clinic.change_doctor_address("D1", "1").unwrap();
    clinic.change_doctor_address("D1", "12 Oak St").unwrap();

    assert_eq!(
        clinic.find_doctor_by_id("D1").unwrap(),
        Doctor::new("D1", "Alice", "12 Oak St")
    );
    assert_eq!(clinic.find_doctor_by_id("D2").unwrap().name, "Bob");
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_reopen_sees_identical_state() {
    let temp_dir = TempDir::new().unwrap();
    let (doctors, alices, d1_appts, stats) = {
        let mut clinic = open(&temp_dir);
        seed(&mut clinic);
        clinic.delete_doctor("D2").unwrap();
        clinic.reschedule_appointment("A1", "2024-01-02").unwrap();
        let snapshot = (
            clinic.find_doctor_by_id("D1").unwrap(),
            clinic.find_doctors_by_name("Alice").unwrap(),
            clinic.find_appointments_by_doctor("D1").unwrap(),
            clinic.stats(),
        );
        clinic.close().unwrap();
        snapshot
    };

    let clinic = open(&temp_dir);
    assert_eq!(clinic.find_doctor_by_id("D1").unwrap(), doctors);
    assert_eq!(clinic.find_doctors_by_name("Alice").unwrap(), alices);
    assert_eq!(clinic.find_appointments_by_doctor("D1").unwrap(), d1_appts);
    assert_eq!(clinic.stats(), stats);
    assert_eq!(
        clinic.find_doctor_by_id("D2").unwrap_err().code(),
        StoreErrorCode::NotFound
    );
}

#[test]
fn test_free_space_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let freed = {
        let mut clinic = open(&temp_dir);
        let freed = clinic.insert_doctor("D1", "Alice", "12 Oak St").unwrap();
        clinic.insert_doctor("D2", "Bob", "3 Pine Rd").unwrap();
        clinic.delete_doctor("D1").unwrap();
        clinic.close().unwrap();
        freed
    };

    let mut clinic = open(&temp_dir);
    assert_eq!(clinic.insert_doctor("D5", "Eve", "1 Elm").unwrap(), freed);
}

#[test]
fn test_on_close_policy_loses_unflushed_session() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir).with_flush_policy(FlushPolicy::OnClose);
    {
        let mut clinic = Clinic::open(config.clone()).unwrap();
        clinic.insert_doctor("D1", "Alice", "12 Oak St").unwrap();
        clinic.close().unwrap();
    }
    {
        let mut clinic = Clinic::open(config.clone()).unwrap();
        clinic.insert_doctor("D2", "Bob", "3 Pine Rd").unwrap();
        // dropped without close
    }

    let clinic = Clinic::open(config).unwrap();
    assert!(clinic.find_doctor_by_id("D1").is_ok());
    assert_eq!(
        clinic.find_doctor_by_id("D2").unwrap_err().code(),
        StoreErrorCode::NotFound
    );
}

#[test]
fn test_tampered_snapshot_refuses_to_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut clinic = open(&temp_dir);
        seed(&mut clinic);
        clinic.close().unwrap();
    }

    let secondary = temp_dir.path().join("data/index/doctors.secondary");
    let mut contents = fs::read_to_string(&secondary).unwrap();
    contents.push_str("Mallory D2\n");
    fs::write(&secondary, contents).unwrap();

    let err = Clinic::open(config_for(&temp_dir)).err().unwrap();
    assert_eq!(err.code(), StoreErrorCode::IoFailure);
    assert!(err.to_string().contains("CLINIC_SNAPSHOT_CHECKSUM"));
}

#[test]
fn test_snapshot_pointing_past_data_file_refuses_to_open() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut clinic = open(&temp_dir);
        seed(&mut clinic);
        clinic.close().unwrap();
    }

    fs::remove_file(temp_dir.path().join("data/index/manifest.json")).unwrap();
    fs::write(temp_dir.path().join("data/doctors.dat"), b"").unwrap();

    let err = Clinic::open(config_for(&temp_dir)).err().unwrap();
    assert!(err.to_string().contains("CLINIC_SNAPSHOT_PARSE"));
}
