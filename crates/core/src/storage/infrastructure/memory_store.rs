use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::shared::constants::API_KEY_STORAGE_KEY;
use crate::storage::domain::key_value_store::{KeyValueStore, StorageError};

/// In-process store. Used for one-off credentials (`--api-key`) and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(key: &str) -> Self {
        let store = Self::new();
        store.insert(API_KEY_STORAGE_KEY, key);
        store
    }

    fn insert(&self, key: &str, value: &str) {
        self.lock_values().insert(key.to_string(), value.to_string());
    }

    fn lock_values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock_values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock_values().remove(key);
        Ok(())
    }
}
