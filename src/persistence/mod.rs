//! Durable storage for the serialized metrics snapshot.
//!
//! The engine only ever sees a [`PersistenceAdapter`]: one fixed key in a
//! generic string key-value store.

pub mod memory;
pub mod redis_store;

use std::sync::Arc;

use crate::error::StorageError;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "endpoint-latency:metrics:v1";

/// A string-keyed, string-valued durable store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Binds a [`KeyValueStore`] to the single key the snapshot lives under.
#[derive(Clone)]
pub struct PersistenceAdapter {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl PersistenceAdapter {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn save(&self, payload: &str) -> Result<(), StorageError> {
        self.backend.set(&self.key, payload)
    }

    pub fn load(&self) -> Result<Option<String>, StorageError> {
        self.backend.get(&self.key)
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
