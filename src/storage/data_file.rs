//! Byte-level access to one data file
//!
//! Frames are located only by offset, never by scanning. Writes either
//! append at end of file or overwrite an existing slot; nothing is ever
//! shifted or truncated.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::frame::{self, Frame, FrameStatus, PAD_BYTE};

/// Read window used when measuring padding after a frame
const PAD_PROBE_CHUNK: usize = 64;

/// A data file holding a sequence of frames
pub struct DataFile {
    path: PathBuf,
    file: File,
    len: u64,
}

impl DataFile {
    /// Opens or creates the data file at `path`.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                StorageError::io_error(format!("Failed to open data file: {}", path.display()), e)
            })?;

        let len = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read data file metadata", e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
        })
    }

    /// Returns the path of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current end-of-file offset.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns whether the file holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `bytes` at end of file and returns the offset they start at.
    pub fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        let offset = self.len;
        self.write_at(offset, bytes)?;
        Ok(offset)
    }

    /// Writes `frame` at `offset` and pads the rest of a `capacity`-byte slot.
    ///
    /// Caller guarantees `frame.len() <= capacity`.
    pub fn write_slot(&mut self, offset: u64, frame: &[u8], capacity: u64) -> StorageResult<()> {
        let mut bytes = frame.to_vec();
        let pad = (capacity as usize).saturating_sub(frame.len());
        bytes.resize(frame.len() + pad, PAD_BYTE);
        self.write_at(offset, &bytes)
    }

    /// Flips the status byte of the frame at `offset` to the tombstone marker.
    pub fn mark_tombstone(&mut self, offset: u64) -> StorageResult<()> {
        self.write_at(offset, &[FrameStatus::Tombstoned.marker()])
    }

    /// Reads and decodes the frame starting at `offset`.
    pub fn read_frame(&self, offset: u64) -> StorageResult<Frame> {
        if offset >= self.len {
            return Err(StorageError::malformed_at_offset(
                offset,
                format!("Offset beyond end of data file ({} bytes)", self.len),
            ));
        }

        let mut reader = BufReader::new(&self.file);
        reader.seek(SeekFrom::Start(offset)).map_err(|e| {
            StorageError::io_error_at_offset(offset, "Failed to seek data file", e)
        })?;

        frame::decode(&mut reader)
            .ok_or_else(|| StorageError::malformed_at_offset(offset, "Unreadable frame"))
    }

    /// Measures the full slot occupied by a frame of `frame_len` bytes at
    /// `offset`: the frame plus any padding that follows it.
    pub fn slot_span(&self, offset: u64, frame_len: usize) -> StorageResult<u64> {
        let frame_end = offset + frame_len as u64;
        if frame_end >= self.len {
            return Ok(frame_len as u64);
        }

        let mut reader = BufReader::new(&self.file);
        reader.seek(SeekFrom::Start(frame_end)).map_err(|e| {
            StorageError::io_error_at_offset(frame_end, "Failed to seek data file", e)
        })?;

        let mut padding = 0u64;
        let mut chunk = [0u8; PAD_PROBE_CHUNK];
        loop {
            let read = reader.read(&mut chunk).map_err(|e| {
                StorageError::io_error_at_offset(frame_end, "Failed to read slot padding", e)
            })?;
            if read == 0 {
                break;
            }
            let run = chunk[..read].iter().take_while(|b| **b == PAD_BYTE).count();
            padding += run as u64;
            if run < read {
                break;
            }
        }

        Ok(frame_len as u64 + padding)
    }

    /// Flushes file contents to disk.
    pub fn sync(&self) -> StorageResult<()> {
        self.file
            .sync_all()
            .map_err(|e| StorageError::io_error("Failed to sync data file", e))
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> StorageResult<()> {
        self.file.seek(SeekFrom::Start(offset)).map_err(|e| {
            StorageError::io_error_at_offset(offset, "Failed to seek data file", e)
        })?;
        self.file.write_all(bytes).map_err(|e| {
            StorageError::io_error_at_offset(offset, "Failed to write data file", e)
        })?;
        self.len = self.len.max(offset + bytes.len() as u64);
        Ok(())
    }
}
