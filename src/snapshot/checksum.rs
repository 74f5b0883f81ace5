//! CRC32 checksums for index snapshot files
//!
//! Checksums are recorded in the manifest as `crc32:xxxxxxxx` and verified
//! before any snapshot file is parsed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crc32fast::Hasher;

use super::errors::{SnapshotError, SnapshotResult};

/// CRC32 (IEEE) of `data`
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// CRC32 of a whole file, read in 8KB chunks.
pub fn compute_file_checksum(path: &Path) -> SnapshotResult<u32> {
    let file = File::open(path).map_err(|e| SnapshotError::io_error_at_path(path, e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| SnapshotError::io_error_at_path(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}

/// Formats a checksum as `crc32:xxxxxxxx` (lowercase, zero-padded)
pub fn format_checksum(checksum: u32) -> String {
    format!("crc32:{:08x}", checksum)
}

/// Parses a `crc32:xxxxxxxx` string
pub fn parse_checksum(formatted: &str) -> Option<u32> {
    let hex = formatted.strip_prefix("crc32:")?;
    if hex.is_empty() || hex.len() > 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}
