use std::collections::HashMap;

use parking_lot::Mutex;

use super::KeyValueStore;
use crate::error::StorageError;

/// Process-local store. Used by tests and `--storage memory`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<u64>,
    unavailable: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> u64 {
        *self.writes.lock()
    }

    /// Simulate a disabled or full backend: every call fails.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    fn check(&self) -> Result<(), StorageError> {
        if *self.unavailable.lock() {
            Err(StorageError::Unavailable("memory store disabled".into()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }
}
