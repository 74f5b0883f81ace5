//! Free-space list: reclaimed slot offset -> slot capacity
//!
//! Capacity is the slot's whole on-disk span (status byte, length digits,
//! delimiter, payload, and trailing padding). Allocation is first-fit in
//! ascending offset order and consumes the entire slot; adjacent slots are
//! never merged.

use std::collections::BTreeMap;

use super::primary::StorageOffset;

/// Reusable slots drawn from tombstoned frames
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreeSpaceList {
    slots: BTreeMap<StorageOffset, u64>,
}

/// A slot handed out by [`FreeSpaceList::allocate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: StorageOffset,
    pub capacity: u64,
}

impl FreeSpaceList {
    /// Creates an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lowest-offset slot with at least `required` bytes.
    pub fn allocate(&mut self, required: u64) -> Option<Slot> {
        let (&offset, &capacity) = self
            .slots
            .iter()
            .find(|(_, capacity)| **capacity >= required)?;
        self.slots.remove(&offset);
        Some(Slot { offset, capacity })
    }

    /// Records a reclaimed slot, overwriting any entry at the same offset.
    pub fn reclaim(&mut self, offset: StorageOffset, capacity: u64) {
        self.slots.insert(offset, capacity);
    }

    /// Capacity recorded for `offset`
    pub fn capacity_at(&self, offset: StorageOffset) -> Option<u64> {
        self.slots.get(&offset).copied()
    }

    /// Slots in offset order
    pub fn iter(&self) -> impl Iterator<Item = (StorageOffset, u64)> + '_ {
        self.slots.iter().map(|(o, c)| (*o, *c))
    }

    /// Number of free slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether no slot is free
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of all free capacities
    pub fn total_bytes(&self) -> u64 {
        self.slots.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fit_in_offset_order() {
        let mut list = FreeSpaceList::new();
        list.reclaim(100, 10);
        list.reclaim(40, 30);
        list.reclaim(200, 50);

        // 40 is the first slot in offset order that fits 20 bytes
        assert_eq!(list.allocate(20), Some(Slot { offset: 40, capacity: 30 }));
        assert_eq!(list.allocate(20), Some(Slot { offset: 200, capacity: 50 }));
        assert_eq!(list.allocate(20), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let mut list = FreeSpaceList::new();
        list.reclaim(0, 24);
        assert_eq!(list.allocate(24), Some(Slot { offset: 0, capacity: 24 }));
        assert!(list.is_empty());
    }

    #[test]
    fn test_reclaim_overwrites() {
        let mut list = FreeSpaceList::new();
        list.reclaim(8, 10);
        list.reclaim(8, 16);
        assert_eq!(list.capacity_at(8), Some(16));
        assert_eq!(list.total_bytes(), 16);
    }
}
