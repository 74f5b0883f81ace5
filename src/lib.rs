//! clinicdb - doctor and appointment records in indexed flat files
//!
//! Records are framed into append-mostly data files. Primary, secondary,
//! and free-space indexes live in memory and are persisted as plain-text
//! snapshots under `<data_dir>/index/`.

pub mod api;
pub mod cli;
pub mod clinic;
pub mod index;
pub mod observability;
pub mod query;
pub mod snapshot;
pub mod storage;
pub mod store;
