//! Generic record store over one data file
//!
//! Owns the data file and its three index structures. Each operation runs
//! to completion: disk bytes are written first, then the in-memory indexes
//! are mutated, so a failed write leaves the indexes untouched.
//!
//! State per record: `Absent -> Live -> Tombstoned`. Updates keep the
//! offset. A tombstoned slot only comes back to life as a different key's
//! insert.

use std::marker::PhantomData;
use std::path::Path;

use serde::Serialize;

use crate::index::{IndexSet, StorageOffset};
use crate::observability::{Event, Logger};
use crate::storage::{frame, DataFile, Frame, FrameStatus, StorageError};

use super::errors::{StoreError, StoreResult};
use super::record::Record;

/// Occupancy figures for one store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub live_records: usize,
    pub free_slots: usize,
    pub free_bytes: u64,
    pub data_file_bytes: u64,
}

/// Record store for one entity kind
pub struct RecordStore<R: Record> {
    data: DataFile,
    indexes: IndexSet,
    _record: PhantomData<R>,
}

impl<R: Record> RecordStore<R> {
    /// Opens the data file at `data_path` with previously loaded indexes.
    pub fn open(data_path: &Path, indexes: IndexSet) -> StoreResult<Self> {
        let data = DataFile::open(data_path)?;

        Logger::info(
            Event::StoreOpen,
            &[
                ("kind", R::KIND),
                ("path", data_path.display().to_string().as_str()),
                ("live", indexes.primary.len().to_string().as_str()),
                ("free_slots", indexes.free_space.len().to_string().as_str()),
            ],
        );

        Ok(Self {
            data,
            indexes,
            _record: PhantomData,
        })
    }

    /// The store's index structures, for snapshotting
    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// Returns whether `key` is live
    pub fn contains(&self, key: &str) -> bool {
        self.indexes.primary.contains(key)
    }

    /// Size of the data file in bytes
    pub fn data_len(&self) -> u64 {
        self.data.len()
    }

    /// Writes a new record and returns the offset of its frame.
    ///
    /// Reuses the first free slot large enough for the frame, otherwise
    /// appends at end of file.
    pub fn insert(&mut self, record: &R) -> StoreResult<StorageOffset> {
        record.validate()?;
        let key = record.key();
        if self.contains(key) {
            return Err(StoreError::duplicate_key(R::KIND, key));
        }

        let encoded = frame::encode(&record.to_fields());
        let offset = match self.indexes.free_space.allocate(encoded.len() as u64) {
            Some(slot) => {
                if let Err(e) = self.data.write_slot(slot.offset, &encoded, slot.capacity) {
                    self.indexes.free_space.reclaim(slot.offset, slot.capacity);
                    return Err(e.into());
                }
                Logger::info(
                    Event::SlotReuse,
                    &[
                        ("kind", R::KIND),
                        ("offset", slot.offset.to_string().as_str()),
                        ("capacity", slot.capacity.to_string().as_str()),
                        ("frame_len", encoded.len().to_string().as_str()),
                    ],
                );
                slot.offset
            }
            None => {
                let offset = self.data.append(&encoded)?;
                Logger::trace(
                    Event::SlotAppend,
                    &[("kind", R::KIND), ("offset", offset.to_string().as_str())],
                );
                offset
            }
        };

        self.indexes.primary.put(key, offset);
        self.indexes.secondary.put(record.indexed_value(), key);

        Logger::info(
            Event::RecordInsert,
            &[("kind", R::KIND), ("key", key), ("offset", offset.to_string().as_str())],
        );
        Ok(offset)
    }

    /// Reads the live record stored under `key`.
    pub fn get(&self, key: &str) -> StoreResult<R> {
        let offset = self.offset_of(key)?;
        let frame = self.read_live_frame(key, offset)?;
        self.decode_record(key, offset, frame)
    }

    /// Reads every live record whose indexed attribute equals `value`, in
    /// bucket order. Keys in the bucket with no primary entry are skipped.
    pub fn find_by_attribute(&self, value: &str) -> StoreResult<Vec<R>> {
        let mut records = Vec::new();
        for key in self.indexes.secondary.lookup(value) {
            if !self.contains(&key) {
                Logger::warn(
                    Event::RecordMalformed,
                    &[
                        ("kind", R::KIND),
                        ("key", key.as_str()),
                        ("reason", "secondary entry without primary entry"),
                    ],
                );
                continue;
            }
            records.push(self.get(&key)?);
        }
        Ok(records)
    }

    /// Tombstones the record under `key` and returns its slot to the
    /// free-space list.
    pub fn delete(&mut self, key: &str) -> StoreResult<()> {
        let offset = self.offset_of(key)?;
        let frame = self.read_live_frame(key, offset)?;
        let encoded_len = frame.encoded_len;
        let record = self.decode_record(key, offset, frame)?;
        let span = self.data.slot_span(offset, encoded_len)?;

        self.data.mark_tombstone(offset)?;

        self.indexes.primary.remove(key);
        self.indexes.secondary.remove(record.indexed_value(), key);
        self.indexes.free_space.reclaim(offset, span);

        Logger::info(
            Event::RecordDelete,
            &[
                ("kind", R::KIND),
                ("key", key),
                ("offset", offset.to_string().as_str()),
                ("reclaimed", span.to_string().as_str()),
            ],
        );
        Ok(())
    }

    /// Rewrites the record under `key` in place after applying `change`.
    ///
    /// The key itself cannot change. The new frame must fit the slot the
    /// record already occupies (frame plus padding); only the last slot in
    /// the file may grow. A shorter frame leaves the rest of the slot
    /// padded. If the indexed attribute changed, the key moves buckets.
    pub fn update<F>(&mut self, key: &str, change: F) -> StoreResult<R>
    where
        F: FnOnce(&mut R),
    {
        let offset = self.offset_of(key)?;
        let frame = self.read_live_frame(key, offset)?;
        let old_len = frame.encoded_len;
        let current = self.decode_record(key, offset, frame)?;

        let mut updated = current.clone();
        change(&mut updated);
        if updated.key() != key {
            return Err(StoreError::invalid_field("id", "key cannot be changed by update"));
        }
        updated.validate()?;

        let encoded = frame::encode(&updated.to_fields());
        let span = self.data.slot_span(offset, old_len)?;
        let at_tail = offset + span == self.data.len();
        let needed = encoded.len() as u64;
        if needed > span && !at_tail {
            return Err(StoreError::record_too_large(key, needed, span));
        }

        self.data.write_slot(offset, &encoded, span.max(needed))?;

        self.indexes.secondary.move_key(
            current.indexed_value(),
            updated.indexed_value(),
            key,
        );

        Logger::info(
            Event::RecordUpdate,
            &[("kind", R::KIND), ("key", key), ("offset", offset.to_string().as_str())],
        );
        Ok(updated)
    }

    /// Current occupancy
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            live_records: self.indexes.primary.len(),
            free_slots: self.indexes.free_space.len(),
            free_bytes: self.indexes.free_space.total_bytes(),
            data_file_bytes: self.data.len(),
        }
    }

    /// Flushes the data file to disk.
    pub fn sync(&self) -> StoreResult<()> {
        Ok(self.data.sync()?)
    }

    fn offset_of(&self, key: &str) -> StoreResult<StorageOffset> {
        self.indexes
            .primary
            .get(key)
            .ok_or_else(|| StoreError::not_found(R::KIND, key))
    }

    fn read_live_frame(&self, key: &str, offset: StorageOffset) -> StoreResult<Frame> {
        let frame = self
            .data
            .read_frame(offset)
            .map_err(|e| self.storage_failure(key, offset, e))?;
        if frame.status == FrameStatus::Tombstoned {
            return Err(self.corruption(key, offset, "primary index points at a tombstone"));
        }
        Ok(frame)
    }

    fn decode_record(&self, key: &str, offset: StorageOffset, frame: Frame) -> StoreResult<R> {
        let record = R::from_fields(frame.fields)
            .ok_or_else(|| self.corruption(key, offset, "frame has the wrong field count"))?;
        if record.key() != key {
            return Err(self.corruption(key, offset, "frame belongs to a different key"));
        }
        Ok(record)
    }

    fn storage_failure(&self, key: &str, offset: StorageOffset, err: StorageError) -> StoreError {
        if err.is_fatal() {
            self.corruption(key, offset, err.message())
        } else {
            err.into()
        }
    }

    /// Logs the broken invariant distinctly before handing it back.
    fn corruption(&self, key: &str, offset: StorageOffset, reason: &str) -> StoreError {
        Logger::error(
            Event::RecordMalformed,
            &[
                ("kind", R::KIND),
                ("key", key),
                ("offset", offset.to_string().as_str()),
                ("reason", reason),
            ],
        );
        StoreError::malformed(key, offset, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::{Appointment, Doctor};
    use crate::store::StoreErrorCode;
    use std::fs;
    use tempfile::TempDir;

    fn open_doctors(dir: &TempDir) -> RecordStore<Doctor> {
        RecordStore::open(&dir.path().join("doctors.dat"), IndexSet::new()).unwrap()
    }

    #[test]
    fn test_insert_then_get() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        let doctor = Doctor::new("D1", "Alice", "12 Oak St");
        assert_eq!(store.insert(&doctor).unwrap(), 0);
        assert_eq!(store.get("D1").unwrap(), doctor);
    }

    #[test]
    fn test_duplicate_key_leaves_original() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        store.insert(&Doctor::new("D1", "Alice", "12 Oak St")).unwrap();
        let err = store.insert(&Doctor::new("D1", "Bob", "x")).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::DuplicateKey);
        assert_eq!(store.get("D1").unwrap().name, "Alice");
        assert!(store.find_by_attribute("Bob").unwrap().is_empty());
    }

    #[test]
    fn test_delete_reclaims_full_span() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        let doctor = Doctor::new("D1", "Alice", "12 Oak St");
        let len = frame::encode(&doctor.to_fields()).len() as u64;
        store.insert(&doctor).unwrap();
        store.insert(&Doctor::new("D2", "Bob", "x")).unwrap();

        store.delete("D1").unwrap();
        assert_eq!(store.indexes().free_space.capacity_at(0), Some(len));
        assert_eq!(store.get("D1").unwrap_err().code(), StoreErrorCode::NotFound);
        assert_eq!(store.delete("D1").unwrap_err().code(), StoreErrorCode::NotFound);
        assert!(store.find_by_attribute("Alice").unwrap().is_empty());
    }

    #[test]
    fn test_reused_slot_keeps_capacity_across_generations() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        let big = Doctor::new("D1", "Alexandra", "12 Oak Street");
        let capacity = frame::encode(&big.to_fields()).len() as u64;
        store.insert(&big).unwrap();
        store.insert(&Doctor::new("D2", "Bob", "x")).unwrap();
        store.delete("D1").unwrap();

        // Smaller record lands in the reclaimed slot
        assert_eq!(store.insert(&Doctor::new("D3", "Al", "y")).unwrap(), 0);
        assert_eq!(store.get("D3").unwrap().name, "Al");
        assert_eq!(store.get("D2").unwrap().name, "Bob");

        // Deleting it again gives back the whole original slot
        store.delete("D3").unwrap();
        assert_eq!(store.indexes().free_space.capacity_at(0), Some(capacity));
    }

    #[test]
    fn test_too_large_record_appends() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        store.insert(&Doctor::new("D1", "Al", "x")).unwrap();
        store.insert(&Doctor::new("D2", "Bob", "y")).unwrap();
        store.delete("D1").unwrap();

        let end = store.data_len();
        let offset = store
            .insert(&Doctor::new("D3", "Maximilian", "1 Long Road"))
            .unwrap();
        assert_eq!(offset, end);
        assert_eq!(store.stats().free_slots, 1);
    }

    #[test]
    fn test_update_non_indexed_field() {
        let dir = TempDir::new().unwrap();
        let mut store: RecordStore<Appointment> =
            RecordStore::open(&dir.path().join("appointments.dat"), IndexSet::new()).unwrap();

        store.insert(&Appointment::new("A1", "2024-01-01", "D1")).unwrap();
        store.insert(&Appointment::new("A2", "2024-02-02", "D1")).unwrap();

        let updated = store.update("A1", |a| a.date = "2024-03-03".into()).unwrap();
        assert_eq!(updated.date, "2024-03-03");
        assert_eq!(store.get("A1").unwrap().date, "2024-03-03");
        assert_eq!(store.get("A2").unwrap().date, "2024-02-02");
        assert_eq!(store.indexes().secondary.lookup("D1"), vec!["A1", "A2"]);
    }

    #[test]
    fn test_update_indexed_field_moves_bucket() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        store.insert(&Doctor::new("D1", "Alice", "12 Oak St")).unwrap();
        store.insert(&Doctor::new("D2", "Bob", "x")).unwrap();

        store.update("D1", |d| d.name = "Ann".into()).unwrap();

        assert!(store.find_by_attribute("Alice").unwrap().is_empty());
        let anns = store.find_by_attribute("Ann").unwrap();
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].address, "12 Oak St");
    }

    #[test]
    fn test_update_shrink_then_grow_within_slot() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        store.insert(&Doctor::new("D1", "Alexandra", "x")).unwrap();
        store.insert(&Doctor::new("D2", "Bob", "y")).unwrap();

        store.update("D1", |d| d.name = "Al".into()).unwrap();
        store.update("D1", |d| d.name = "Alexandra".into()).unwrap();

        assert_eq!(store.get("D1").unwrap().name, "Alexandra");
        assert_eq!(store.get("D2").unwrap().name, "Bob");
    }

    #[test]
    fn test_update_overrun_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        store.insert(&Doctor::new("D1", "Al", "x")).unwrap();
        store.insert(&Doctor::new("D2", "Bob", "y")).unwrap();

        let err = store
            .update("D1", |d| d.name = "Bartholomew".into())
            .unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::RecordTooLarge);

        // Nothing moved
        assert_eq!(store.get("D1").unwrap().name, "Al");
        assert_eq!(store.get("D2").unwrap().name, "Bob");
        assert_eq!(store.find_by_attribute("Al").unwrap().len(), 1);
    }

    #[test]
    fn test_last_record_may_grow() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);

        store.insert(&Doctor::new("D1", "Al", "x")).unwrap();
        store.insert(&Doctor::new("D2", "Bob", "y")).unwrap();
        store
            .update("D2", |d| d.address = "100 Very Long Avenue".into())
            .unwrap();
        assert_eq!(store.get("D2").unwrap().address, "100 Very Long Avenue");
        assert_eq!(store.get("D1").unwrap().name, "Al");
    }

    #[test]
    fn test_update_cannot_change_key() {
        let dir = TempDir::new().unwrap();
        let mut store = open_doctors(&dir);
        store.insert(&Doctor::new("D1", "Al", "x")).unwrap();

        let err = store.update("D1", |d| d.id = "D9".into()).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::InvalidField);
        assert!(store.contains("D1"));
    }

    #[test]
    fn test_corrupted_frame_reports_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doctors.dat");
        let mut store = open_doctors(&dir);
        store.insert(&Doctor::new("D1", "Alice", "x")).unwrap();

        // Clobber the length prefix on disk
        let mut bytes = fs::read(&path).unwrap();
        bytes[1] = b'?';
        fs::write(&path, bytes).unwrap();

        let err = store.get("D1").unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::MalformedRecord);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_bucket_key_without_primary_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut indexes = IndexSet::new();
        indexes.secondary.put("Alice", "GHOST");
        let mut store: RecordStore<Doctor> =
            RecordStore::open(&dir.path().join("doctors.dat"), indexes).unwrap();
        store.insert(&Doctor::new("D1", "Alice", "x")).unwrap();

        let found = store.find_by_attribute("Alice").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "D1");
    }
}
