//! Record stores for clinicdb
//!
//! One generic [`RecordStore`] is instantiated per entity kind. It ties a
//! data file to its primary index, secondary index, and free-space list.
//!
//! # Invariants
//!
//! - The primary index only points at live frames
//! - A key sits in at most one secondary bucket, the one for its current
//!   indexed value
//! - A free-space offset is never referenced by the primary index
//! - Frames are never relocated; updates that do not fit are rejected

mod errors;
mod record;
mod record_store;

pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use record::{Appointment, Doctor, Record};
pub use record_store::{RecordStore, StoreStats};
