//! Clinic facade
//!
//! Owns the doctor and appointment stores for one data directory, enforces
//! the appointment -> doctor reference at insert time, and decides when
//! index snapshots are written (see [`FlushPolicy`]).

mod config;
mod facade;

pub use config::{ClinicConfig, ConfigError, ConfigResult, FlushPolicy, DEFAULT_CONFIG_PATH};
pub use facade::{data_file_path, Clinic, ClinicStats, APPOINTMENTS_TABLE, DOCTORS_TABLE};
