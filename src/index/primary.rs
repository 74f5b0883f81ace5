//! Primary index: record key -> frame offset
//!
//! BTreeMap keeps snapshot iteration ordered by key.

use std::collections::BTreeMap;

/// Byte offset of a frame in a data file
pub type StorageOffset = u64;

/// Exactly one entry per live key
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrimaryIndex {
    entries: BTreeMap<String, StorageOffset>,
}

impl PrimaryIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the live frame for `key`
    pub fn get(&self, key: &str) -> Option<StorageOffset> {
        self.entries.get(key).copied()
    }

    /// Returns whether `key` is live
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Points `key` at `offset`, replacing any previous entry
    pub fn put(&mut self, key: impl Into<String>, offset: StorageOffset) {
        self.entries.insert(key.into(), offset);
    }

    /// Drops `key`, returning the offset it pointed at
    pub fn remove(&mut self, key: &str) -> Option<StorageOffset> {
        self.entries.remove(key)
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, StorageOffset)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no key is live
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let mut index = PrimaryIndex::new();
        index.put("D1", 0);
        index.put("D2", 24);

        assert_eq!(index.get("D1"), Some(0));
        assert_eq!(index.get("D2"), Some(24));
        assert!(index.contains("D1"));

        assert_eq!(index.remove("D1"), Some(0));
        assert_eq!(index.get("D1"), None);
        assert_eq!(index.remove("D1"), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut index = PrimaryIndex::new();
        index.put("c", 30);
        index.put("a", 10);
        index.put("b", 20);

        let keys: Vec<&str> = index.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
