use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::shared::atomic_file::write_atomic;
use crate::shared::constants::APP_DIR_NAME;
use crate::storage::domain::key_value_store::{KeyValueStore, StorageError};

const STORE_FILE_NAME: &str = "storage.json";

/// String map persisted as pretty JSON.
///
/// The file is read once on open and rewritten in full on every change,
/// via a `.part` sibling renamed over the target so a crash never leaves
/// a half-written store. Missing or unreadable files start empty.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Opens the store in the platform config directory.
    ///
    /// - macOS: `~/Library/Application Support/VoiceFair/storage.json`
    /// - Linux: `$XDG_CONFIG_HOME/VoiceFair/storage.json`
    /// - Windows: `%APPDATA%/VoiceFair/storage.json`
    pub fn open_default() -> Result<Self, StorageError> {
        let path = dirs::config_dir()
            .map(|d| d.join(APP_DIR_NAME).join(STORE_FILE_NAME))
            .ok_or(StorageError::NoConfigDir)?;
        Ok(Self::open(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // A panic elsewhere must not hide values that are already on disk.
    fn lock_values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let mut values = self.lock_values();
        let mut next = values.clone();
        change(&mut next);
        persist(&self.path, &next)?;
        *values = next;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock_values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|m| {
            m.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|m| {
            m.remove(key);
        })
    }
}

fn persist(path: &Path, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(values)?;
    write_atomic(path, json.as_bytes()).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })
}
