//! In-memory indexes for clinicdb
//!
//! Each record store owns one of each:
//!
//! - `PrimaryIndex`: key -> frame offset
//! - `SecondaryIndex`: attribute value -> keys
//! - `FreeSpaceList`: reclaimed offset -> slot capacity
//!
//! All three are BTreeMap-backed so snapshot files come out in a stable
//! order. They are loaded once per session from snapshot files and never
//! rebuilt by scanning data files.

mod free_space;
mod primary;
mod secondary;

pub use free_space::{FreeSpaceList, Slot};
pub use primary::{PrimaryIndex, StorageOffset};
pub use secondary::SecondaryIndex;

/// The three index structures belonging to one record store
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexSet {
    pub primary: PrimaryIndex,
    pub secondary: SecondaryIndex,
    pub free_space: FreeSpaceList,
}

impl IndexSet {
    /// Creates an empty index set
    pub fn new() -> Self {
        Self::default()
    }
}
