//! KeyValueStore implementation
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{KvError, Result};
use crate::wal::{ApplyEvent, Event, EventType};

/// Thread-safe in-memory key-value map
///
/// `get` takes the read lock; `put`, `delete` and `clear` take the write lock.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    data: RwLock<HashMap<String, String>>,
}

impl KeyValueStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`
    ///
    /// Returns `KvError::NotFound` when the key is absent.
    pub fn get(&self, key: &str) -> Result<String> {
        self.data.read().get(key).cloned().ok_or(KvError::NotFound)
    }

    /// Insert or overwrite a key
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().insert(key.into(), value.into());
    }

    /// Remove a key. Absent keys are not an error.
    pub fn delete(&self, key: &str) {
        self.data.write().remove(key);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of every pair, sorted by key
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    /// Drop every key
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

impl ApplyEvent for KeyValueStore {
    fn apply(&self, event: &Event) {
        match event.event_type {
            EventType::Put => self.put(event.key.as_str(), event.value.as_str()),
            EventType::Delete => self.delete(&event.key),
        }
    }
}
