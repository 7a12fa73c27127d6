use super::key_value_store::{KeyValueStore, StorageError};
use crate::shared::constants::API_KEY_STORAGE_KEY;

/// Reads the stored API key. Blank values count as absent.
pub fn load_api_key(store: &dyn KeyValueStore) -> Option<String> {
    store
        .get(API_KEY_STORAGE_KEY)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

pub fn save_api_key(store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
    store.set(API_KEY_STORAGE_KEY, key.trim())
}

pub fn clear_api_key(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(API_KEY_STORAGE_KEY)
}

/// Masks a key for display, keeping only the last four characters.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{visible}", "*".repeat(chars.len() - 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::infrastructure::memory_store::MemoryStore;

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(load_api_key(&store), None);
    }

    #[test]
    fn test_blank_key_is_none() {
        let store = MemoryStore::new();
        store.set(API_KEY_STORAGE_KEY, "   ").unwrap();
        assert_eq!(load_api_key(&store), None);
    }

    #[test]
    fn test_save_trims_and_load_returns_key() {
        let store = MemoryStore::new();
        save_api_key(&store, "  sk_abc123 \n").unwrap();
        assert_eq!(load_api_key(&store).as_deref(), Some("sk_abc123"));
    }

    #[test]
    fn test_clear_removes_key() {
        let store = MemoryStore::with_api_key("sk_abc");
        clear_api_key(&store).unwrap();
        assert_eq!(load_api_key(&store), None);
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("sk_12345678"), "*******5678");
        assert_eq!(mask_api_key("abc"), "***");
    }
}
