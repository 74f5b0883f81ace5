//! Observable events for clinicdb
//!
//! Events are explicit and typed; the logger only accepts these.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Session lifecycle
    /// Clinic opened, snapshots loaded
    SessionStart,
    /// Clinic closed, snapshots flushed
    SessionEnd,
    /// A record store opened its data file
    StoreOpen,

    // Record operations
    /// Record written and indexed
    RecordInsert,
    /// Record rewritten in place
    RecordUpdate,
    /// Record tombstoned
    RecordDelete,
    /// Insert landed in a reclaimed slot
    SlotReuse,
    /// Insert appended at end of file
    SlotAppend,
    /// Frame at an indexed offset could not be decoded
    RecordMalformed,
    /// Appointment rejected for an unknown doctor
    ForeignKeyRejected,

    // Snapshots
    /// Index snapshots loaded
    SnapshotLoad,
    /// Index snapshots written
    SnapshotSave,
    /// Snapshot files present without a manifest
    SnapshotUnverified,
    /// Post-mutation flush failed; changes stay pending until the next flush
    FlushDeferred,

    // Front end
    /// Query string translated into a store call
    QueryTranslated,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SessionStart => "SESSION_START",
            Event::SessionEnd => "SESSION_END",
            Event::StoreOpen => "STORE_OPEN",

            Event::RecordInsert => "RECORD_INSERT",
            Event::RecordUpdate => "RECORD_UPDATE",
            Event::RecordDelete => "RECORD_DELETE",
            Event::SlotReuse => "SLOT_REUSE",
            Event::SlotAppend => "SLOT_APPEND",
            Event::RecordMalformed => "RECORD_MALFORMED",
            Event::ForeignKeyRejected => "FOREIGN_KEY_REJECTED",

            Event::SnapshotLoad => "SNAPSHOT_LOAD",
            Event::SnapshotSave => "SNAPSHOT_SAVE",
            Event::SnapshotUnverified => "SNAPSHOT_UNVERIFIED",
            Event::FlushDeferred => "FLUSH_DEFERRED",

            Event::QueryTranslated => "QUERY_TRANSLATED",
        }
    }

    /// Returns true if this event signals internal corruption
    pub fn is_corruption(&self) -> bool {
        matches!(self, Event::RecordMalformed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
