//! Secondary index: attribute value -> ordered keys sharing it
//!
//! A key lives under at most one value. Buckets that become empty are
//! removed so lookups and snapshots never see them.

use std::collections::BTreeMap;

/// One-to-many inverted index
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    buckets: BTreeMap<String, Vec<String>>,
}

impl SecondaryIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key` to the bucket for `value`.
    ///
    /// Duplicates are not filtered; inserting the same key twice is a
    /// caller error.
    pub fn put(&mut self, value: impl Into<String>, key: impl Into<String>) {
        self.buckets.entry(value.into()).or_default().push(key.into());
    }

    /// Removes `key` from the bucket for `value`, dropping the bucket if
    /// it becomes empty. Returns whether the key was present.
    pub fn remove(&mut self, value: &str, key: &str) -> bool {
        let Some(keys) = self.buckets.get_mut(value) else {
            return false;
        };
        let before = keys.len();
        keys.retain(|k| k != key);
        let removed = keys.len() != before;
        if keys.is_empty() {
            self.buckets.remove(value);
        }
        removed
    }

    /// Moves `key` from `old_value` to `new_value`.
    pub fn move_key(&mut self, old_value: &str, new_value: &str, key: &str) {
        if old_value == new_value {
            return;
        }
        self.remove(old_value, key);
        self.put(new_value, key);
    }

    /// Keys stored under `value`, in insertion order
    pub fn lookup(&self, value: &str) -> Vec<String> {
        self.buckets.get(value).cloned().unwrap_or_default()
    }

    /// Buckets in value order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets.iter().map(|(v, keys)| (v.as_str(), keys.as_slice()))
    }

    /// Replaces the bucket for `value` wholesale (snapshot loading)
    pub fn set_bucket(&mut self, value: impl Into<String>, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        self.buckets.insert(value.into(), keys);
    }

    /// Number of distinct values
    pub fn value_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of keys across all buckets
    pub fn key_count(&self) -> usize {
        self.buckets.values().map(|v| v.len()).sum()
    }
}
