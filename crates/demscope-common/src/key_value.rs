//! Header metadata harvested from DEM files.

use serde::{Deserialize, Serialize};

/// A single header card: key, value and optional comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueEntry {
    pub key: String,
    pub value: String,
    pub comment: Option<String>,
}

/// Insertion-ordered map of [`KeyValueEntry`] with unique keys.
///
/// Inserting a key that is already present keeps the existing entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueMap {
    entries: Vec<KeyValueEntry>,
}

impl KeyValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless its key is already present.
    ///
    /// Returns `true` if the entry was added.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>, comment: Option<String>) -> bool {
        self.insert_entry(KeyValueEntry {
            key: key.into(),
            value: value.into(),
            comment,
        })
    }

    /// Insert a prepared entry unless its key is already present.
    pub fn insert_entry(&mut self, entry: KeyValueEntry) -> bool {
        if self.contains_key(&entry.key) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Add every entry of `other` whose key is not yet present.
    ///
    /// Returns the number of entries added.
    pub fn merge_missing(&mut self, other: &KeyValueMap) -> usize {
        other
            .entries
            .iter()
            .filter(|entry| self.insert_entry((*entry).clone()))
            .count()
    }

    pub fn get(&self, key: &str) -> Option<&KeyValueEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(|e| e.value.as_str())
    }

    /// Parse the value of `key` as a float, `None` if missing or malformed.
    pub fn value_f64(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValueEntry> {
        self.entries.iter()
    }
}

impl FromIterator<KeyValueEntry> for KeyValueMap {
    fn from_iter<T: IntoIterator<Item = KeyValueEntry>>(iter: T) -> Self {
        let mut map = KeyValueMap::new();
        for entry in iter {
            map.insert_entry(entry);
        }
        map
    }
}
