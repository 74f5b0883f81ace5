//! Index snapshot manifest
//!
//! `index/manifest.json` is written after every snapshot file of a save
//! has been synced, so its presence means the set is complete.
//!
//! ```json
//! {
//!   "created_at": "2026-02-04T11:30:00Z",
//!   "format_version": 1,
//!   "checksums": {
//!     "doctors.primary": "crc32:deadbeef"
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::errors::{SnapshotError, SnapshotResult};

/// Current manifest layout
pub const FORMAT_VERSION: u8 = 1;

/// Descriptor for one complete set of index snapshot files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexManifest {
    /// RFC3339 UTC timestamp of the save
    pub created_at: String,

    pub format_version: u8,

    /// Snapshot file name -> `crc32:xxxxxxxx`
    pub checksums: BTreeMap<String, String>,
}

impl IndexManifest {
    /// Creates a manifest stamped with the current time.
    pub fn new(checksums: BTreeMap<String, String>) -> Self {
        Self {
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            format_version: FORMAT_VERSION,
            checksums,
        }
    }

    /// Recorded checksum for `file_name`
    pub fn checksum_for(&self, file_name: &str) -> Option<&str> {
        self.checksums.get(file_name).map(String::as_str)
    }

    pub fn to_json(&self) -> SnapshotResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SnapshotError::manifest_error(format!("Failed to serialize manifest: {}", e))
        })
    }

    /// Parses a manifest, rejecting unknown format versions.
    pub fn from_json(json: &str) -> SnapshotResult<Self> {
        let manifest: Self = serde_json::from_str(json).map_err(|e| {
            SnapshotError::manifest_error(format!("Failed to parse manifest: {}", e))
        })?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(SnapshotError::manifest_error(format!(
                "Unsupported manifest format_version {}",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }

    /// Writes the manifest and fsyncs it.
    pub fn write_to_file(&self, path: &Path) -> SnapshotResult<()> {
        let json = self.to_json()?;

        let mut file = File::create(path).map_err(|e| {
            SnapshotError::manifest_io_error(
                format!("Failed to create manifest file: {}", path.display()),
                e,
            )
        })?;
        file.write_all(json.as_bytes()).map_err(|e| {
            SnapshotError::manifest_io_error(
                format!("Failed to write manifest: {}", path.display()),
                e,
            )
        })?;
        file.sync_all().map_err(|e| {
            SnapshotError::manifest_io_error(
                format!("Failed to fsync manifest: {}", path.display()),
                e,
            )
        })
    }

    pub fn read_from_file(path: &Path) -> SnapshotResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SnapshotError::manifest_io_error(
                format!("Failed to read manifest: {}", path.display()),
                e,
            )
        })?;

        Self::from_json(&content)
    }
}
