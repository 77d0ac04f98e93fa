//! Persisted state.
//!
//! The engine only sees the [`StateStore`] trait: a JSON key/value store with
//! read and update. [`SqliteStore`] backs it on disk, [`MemoryStore`] in tests
//! and embedders that keep state elsewhere.

pub mod db;
pub mod ledger;
pub mod manifest;

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

pub use db::SqliteStore;
pub use ledger::InstallLedger;
pub use manifest::{PackageManifest, update_manifest};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State lock poisoned")]
    Poisoned,
}

/// Key/value store holding JSON values.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn update(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Read `key`, substituting `default` when it has never been written.
    fn get_or(&self, key: &str, default: Value) -> Result<Value, StoreError> {
        Ok(self.get(key)?.unwrap_or(default))
    }
}

impl<T: StateStore + ?Sized> StateStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).update(key, value)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_get_or() {
        let store = MemoryStore::new();
        assert_eq!(store.get_or("k", json!([])).unwrap(), json!([]));
        store.update("k", json!(["a"])).unwrap();
        assert_eq!(store.get_or("k", json!([])).unwrap(), json!(["a"]));
    }
}
