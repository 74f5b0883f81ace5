//! Index snapshot persistence for clinicdb
//!
//! Indexes and free-space lists live in memory during a session. This
//! module loads them from `<data_dir>/index/` at open and writes them back
//! on flush. Data files are never scanned to rebuild an index.
//!
//! # Layout
//!
//! ```text
//! <data_dir>/
//!   doctors.dat
//!   appointments.dat
//!   index/
//!     doctors.primary  doctors.secondary  doctors.free
//!     appointments.primary  appointments.secondary  appointments.free
//!     manifest.json
//! ```

pub mod checksum;
mod errors;
mod gateway;
mod manifest;

pub use errors::{Severity, SnapshotError, SnapshotErrorCode, SnapshotResult};
pub use gateway::{escape_token, unescape_token, SnapshotGateway, INDEX_DIR, MANIFEST_FILE};
pub use manifest::{IndexManifest, FORMAT_VERSION};
