//! Loads and saves index structures as plain-text snapshot files
//!
//! Each table has three files under `<data_dir>/index/`:
//!
//! - `<table>.primary`: `<key> <offset>` per line
//! - `<table>.secondary`: `<value> <key1> <key2> ...` per line
//! - `<table>.free`: `<offset> <capacity>` per line
//!
//! Tokens are space-separated and percent-escaped, so a doctor name with
//! spaces stays one token. `manifest.json` is written last and carries a
//! checksum of every file in the set.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::index::{IndexSet, StorageOffset};
use crate::observability::{Event, Logger};

use super::checksum::{compute_checksum, compute_file_checksum, format_checksum, parse_checksum};
use super::errors::{SnapshotError, SnapshotResult};
use super::manifest::IndexManifest;

/// Directory under the data dir that holds snapshot files
pub const INDEX_DIR: &str = "index";

/// Manifest file name inside [`INDEX_DIR`]
pub const MANIFEST_FILE: &str = "manifest.json";

const PRIMARY_EXT: &str = "primary";
const SECONDARY_EXT: &str = "secondary";
const FREE_EXT: &str = "free";

/// Reads and writes index snapshot files for a data directory
#[derive(Debug, Clone)]
pub struct SnapshotGateway {
    index_dir: PathBuf,
}

impl SnapshotGateway {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            index_dir: data_dir.join(INDEX_DIR),
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Loads the index sets for `tables`, given as `(table, data_file_len)`.
    ///
    /// Returned sets are in the same order as `tables`. With no manifest
    /// and no snapshot files every set is empty. With a manifest every
    /// file is checksum-verified before parsing.
    pub fn load(&self, tables: &[(&str, u64)]) -> SnapshotResult<Vec<IndexSet>> {
        let manifest_path = self.index_dir.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            Some(IndexManifest::read_from_file(&manifest_path)?)
        } else {
            None
        };

        if manifest.is_none() {
            let orphans: Vec<String> = tables
                .iter()
                .flat_map(|(table, _)| file_names(table))
                .filter(|name| self.index_dir.join(name).exists())
                .collect();
            if !orphans.is_empty() {
                Logger::warn(
                    Event::SnapshotUnverified,
                    &[
                        ("dir", self.index_dir.display().to_string().as_str()),
                        ("files", orphans.join(",").as_str()),
                    ],
                );
            }
        }

        let mut sets = Vec::with_capacity(tables.len());
        for &(table, data_len) in tables {
            if let Some(ref manifest) = manifest {
                for name in file_names(table) {
                    self.verify(manifest, &name)?;
                }
            }

            let set = self.load_table(table, data_len)?;
            Logger::info(
                Event::SnapshotLoad,
                &[
                    ("table", table),
                    ("primary", set.primary.len().to_string().as_str()),
                    ("secondary", set.secondary.value_count().to_string().as_str()),
                    ("free", set.free_space.len().to_string().as_str()),
                    ("verified", if manifest.is_some() { "true" } else { "false" }),
                ],
            );
            sets.push(set);
        }
        Ok(sets)
    }

    /// Writes every table's snapshot files, then the manifest.
    pub fn save(&self, tables: &[(&str, &IndexSet)]) -> SnapshotResult<()> {
        fs::create_dir_all(&self.index_dir)
            .map_err(|e| SnapshotError::io_error_at_path(&self.index_dir, e))?;

        let mut checksums = std::collections::BTreeMap::new();
        for &(table, set) in tables {
            let files = [
                (file_name(table, PRIMARY_EXT), render_primary(set)),
                (file_name(table, SECONDARY_EXT), render_secondary(set)),
                (file_name(table, FREE_EXT), render_free(set)),
            ];
            for (name, contents) in files {
                self.write_file(&name, contents.as_bytes())?;
                checksums.insert(name, format_checksum(compute_checksum(contents.as_bytes())));
            }

            Logger::info(
                Event::SnapshotSave,
                &[
                    ("table", table),
                    ("primary", set.primary.len().to_string().as_str()),
                    ("free", set.free_space.len().to_string().as_str()),
                ],
            );
        }

        IndexManifest::new(checksums).write_to_file(&self.index_dir.join(MANIFEST_FILE))
    }

    fn verify(&self, manifest: &IndexManifest, name: &str) -> SnapshotResult<()> {
        let expected = manifest.checksum_for(name).ok_or_else(|| {
            SnapshotError::manifest_error(format!("manifest has no entry for {}", name))
        })?;
        let expected_value = parse_checksum(expected).ok_or_else(|| {
            SnapshotError::manifest_error(format!("invalid checksum '{}' for {}", expected, name))
        })?;

        let actual = compute_file_checksum(&self.index_dir.join(name))?;
        if actual != expected_value {
            return Err(SnapshotError::checksum_mismatch(
                name,
                expected,
                &format_checksum(actual),
            ));
        }
        Ok(())
    }

    fn load_table(&self, table: &str, data_len: u64) -> SnapshotResult<IndexSet> {
        let mut set = IndexSet::new();

        let name = file_name(table, PRIMARY_EXT);
        for (line_no, tokens) in self.read_lines(&name)? {
            let [key, offset] = exact_tokens::<2>(&name, line_no, tokens)?;
            let offset = parse_number(&name, line_no, &offset)?;
            if offset >= data_len {
                return Err(SnapshotError::parse_error(
                    &name,
                    line_no,
                    format!("offset {} is beyond data file length {}", offset, data_len),
                ));
            }
            if set.primary.contains(&key) {
                return Err(SnapshotError::parse_error(
                    &name,
                    line_no,
                    format!("duplicate key '{}'", key),
                ));
            }
            set.primary.put(key, offset);
        }

        let name = file_name(table, SECONDARY_EXT);
        for (line_no, mut tokens) in self.read_lines(&name)? {
            if tokens.len() < 2 {
                return Err(SnapshotError::parse_error(
                    &name,
                    line_no,
                    "bucket line needs a value and at least one key",
                ));
            }
            let value = tokens.remove(0);
            if !set.secondary.lookup(&value).is_empty() {
                return Err(SnapshotError::parse_error(
                    &name,
                    line_no,
                    format!("duplicate bucket '{}'", value),
                ));
            }
            set.secondary.set_bucket(value, tokens);
        }

        let name = file_name(table, FREE_EXT);
        for (line_no, tokens) in self.read_lines(&name)? {
            let [offset, capacity] = exact_tokens::<2>(&name, line_no, tokens)?;
            let offset: StorageOffset = parse_number(&name, line_no, &offset)?;
            let capacity = parse_number(&name, line_no, &capacity)?;
            if capacity == 0 || offset.saturating_add(capacity) > data_len {
                return Err(SnapshotError::parse_error(
                    &name,
                    line_no,
                    format!("slot {}+{} is outside the data file", offset, capacity),
                ));
            }
            set.free_space.reclaim(offset, capacity);
        }

        Ok(set)
    }

    /// Non-blank lines of `name` as unescaped tokens, with 1-based line
    /// numbers. A missing file reads as empty.
    fn read_lines(&self, name: &str) -> SnapshotResult<Vec<(usize, Vec<String>)>> {
        let path = self.index_dir.join(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents =
            fs::read_to_string(&path).map_err(|e| SnapshotError::io_error_at_path(&path, e))?;

        let mut lines = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            let line_no = i + 1;
            if line.is_empty() {
                continue;
            }
            let tokens = line
                .split(' ')
                .map(|raw| {
                    unescape_token(raw).ok_or_else(|| {
                        SnapshotError::parse_error(name, line_no, format!("bad token '{}'", raw))
                    })
                })
                .collect::<SnapshotResult<Vec<_>>>()?;
            lines.push((line_no, tokens));
        }
        Ok(lines)
    }

    fn write_file(&self, name: &str, contents: &[u8]) -> SnapshotResult<()> {
        let path = self.index_dir.join(name);
        let mut file = File::create(&path).map_err(|e| SnapshotError::io_error_at_path(&path, e))?;
        file.write_all(contents)
            .map_err(|e| SnapshotError::io_error_at_path(&path, e))?;
        file.sync_all()
            .map_err(|e| SnapshotError::io_error_at_path(&path, e))
    }
}

fn file_name(table: &str, ext: &str) -> String {
    format!("{}.{}", table, ext)
}

fn file_names(table: &str) -> [String; 3] {
    [
        file_name(table, PRIMARY_EXT),
        file_name(table, SECONDARY_EXT),
        file_name(table, FREE_EXT),
    ]
}

fn exact_tokens<const N: usize>(
    name: &str,
    line_no: usize,
    tokens: Vec<String>,
) -> SnapshotResult<[String; N]> {
    let found = tokens.len();
    tokens.try_into().map_err(|_| {
        SnapshotError::parse_error(name, line_no, format!("expected {} tokens, found {}", N, found))
    })
}

fn parse_number(name: &str, line_no: usize, token: &str) -> SnapshotResult<u64> {
    token.parse().map_err(|_| {
        SnapshotError::parse_error(name, line_no, format!("'{}' is not a byte count", token))
    })
}

fn render_primary(set: &IndexSet) -> String {
    let mut out = String::new();
    for (key, offset) in set.primary.iter() {
        out.push_str(&escape_token(key));
        out.push(' ');
        out.push_str(&offset.to_string());
        out.push('\n');
    }
    out
}

fn render_secondary(set: &IndexSet) -> String {
    let mut out = String::new();
    for (value, keys) in set.secondary.iter() {
        out.push_str(&escape_token(value));
        for key in keys {
            out.push(' ');
            out.push_str(&escape_token(key));
        }
        out.push('\n');
    }
    out
}

fn render_free(set: &IndexSet) -> String {
    let mut out = String::new();
    for (offset, capacity) in set.free_space.iter() {
        out.push_str(&format!("{} {}\n", offset, capacity));
    }
    out
}

/// Percent-escapes `%`, space, tab, and newline.
pub fn escape_token(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '\t' => out.push_str("%09"),
            '\n' => out.push_str("%0A"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_token`]. `None` on an empty token, a truncated
/// escape, or bytes that are not UTF-8.
pub fn unescape_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    let bytes = token.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = token.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
