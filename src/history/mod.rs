//! Share history — the last few links, newest first.
//!
//! Loaded once from local storage when opened, and written back in full after
//! every mutation. Unreadable or corrupt records load as an empty history.

mod storage;

pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage key for the serialized history.
pub const HISTORY_KEY: &str = "screenshotHistory";

/// Entries kept; older ones are evicted.
pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Millisecond timestamp of the append, as a string.
    pub id: String,
    pub url: String,
    /// Local time, formatted for display.
    #[serde(rename = "date")]
    pub created_at: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to persist history: {0}")]
    Persist(#[from] std::io::Error),

    #[error("Failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct HistoryStore {
    storage: Arc<dyn KeyValueStore>,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Load history from `storage`. Never fails.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let entries = load(storage.as_ref());
        log::debug!("[HISTORY] Loaded {} entries", entries.len());
        Self { storage, entries }
    }

    /// Entries, newest first.
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Record a freshly shared link at the front, evicting past the cap.
    pub fn append(&mut self, url: &str) -> Result<HistoryEntry, HistoryError> {
        let now = chrono::Local::now();

        // Two appends in the same millisecond would share an id
        let mut millis = now.timestamp_millis();
        while self.entries.iter().any(|e| e.id == millis.to_string()) {
            millis += 1;
        }

        let entry = HistoryEntry {
            id: millis.to_string(),
            url: url.to_string(),
            created_at: now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        };

        let mut entries = Vec::with_capacity(MAX_ENTRIES);
        entries.push(entry.clone());
        entries.extend(self.entries.iter().take(MAX_ENTRIES - 1).cloned());
        self.persist(entries)?;

        log::info!("[HISTORY] Added {} ({} entries)", entry.id, self.entries.len());
        Ok(entry)
    }

    /// Delete the entry with `id`. Unknown ids leave the history unchanged.
    pub fn remove(&mut self, id: &str) -> Result<(), HistoryError> {
        let entries = self
            .entries
            .iter()
            .filter(|e| e.id != id)
            .cloned()
            .collect();
        self.persist(entries)
    }

    /// Empty the history and delete the persisted record.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.storage.remove_item(HISTORY_KEY)?;
        self.entries.clear();
        log::info!("[HISTORY] Cleared");
        Ok(())
    }

    /// Write `entries` out, and adopt them only once storage has them.
    fn persist(&mut self, entries: Vec<HistoryEntry>) -> Result<(), HistoryError> {
        let json = serde_json::to_string(&entries)?;
        self.storage.set_item(HISTORY_KEY, &json)?;
        self.entries = entries;
        Ok(())
    }
}

fn load(storage: &dyn KeyValueStore) -> Vec<HistoryEntry> {
    let raw = match storage.get_item(HISTORY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("[HISTORY] Could not read stored history: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
        Ok(mut entries) => {
            entries.truncate(MAX_ENTRIES);
            entries
        }
        Err(e) => {
            log::warn!("[HISTORY] Stored history is corrupt, starting empty: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn memory() -> Arc<MemoryKeyValueStore> {
        Arc::new(MemoryKeyValueStore::new())
    }

    #[test]
    fn empty_storage_loads_empty() {
        let store = HistoryStore::open(memory());
        assert!(store.list().is_empty());
    }

    #[test]
    fn corrupt_storage_loads_empty() {
        let storage = memory();
        storage.set_item(HISTORY_KEY, "{not json").unwrap();
        let store = HistoryStore::open(storage);
        assert!(store.list().is_empty());
    }

    #[test]
    fn wrong_shape_loads_empty() {
        let storage = memory();
        storage.set_item(HISTORY_KEY, r#"{"id":"1"}"#).unwrap();
        assert!(HistoryStore::open(storage).list().is_empty());
    }

    #[test]
    fn append_prepends_and_persists() {
        let storage = memory();
        let mut store = HistoryStore::open(storage.clone());

        let before = chrono::Local::now().timestamp_millis();
        let first = store.append("https://a").unwrap();
        let second = store.append("https://b").unwrap();
        let after = chrono::Local::now().timestamp_millis();

        let id: i64 = first.id.parse().unwrap();
        assert!(id >= before && id <= after + 1);
        assert_ne!(first.id, second.id);

        let urls: Vec<_> = store.list().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b", "https://a"]);

        let reopened = HistoryStore::open(storage);
        assert_eq!(reopened.list(), store.list());
    }

    #[test]
    fn append_caps_at_ten_evicting_oldest() {
        let mut store = HistoryStore::open(memory());
        for i in 0..11 {
            store.append(&format!("https://link/{}", i)).unwrap();
        }
        assert_eq!(store.list().len(), MAX_ENTRIES);
        assert_eq!(store.list()[0].url, "https://link/10");
        assert!(store.list().iter().all(|e| e.url != "https://link/0"));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = HistoryStore::open(memory());
        let entry = store.append("https://a").unwrap();
        store.append("https://b").unwrap();

        store.remove("does-not-exist").unwrap();
        assert_eq!(store.list().len(), 2);

        store.remove(&entry.id).unwrap();
        store.remove(&entry.id).unwrap();
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].url, "https://b");
    }

    #[test]
    fn clear_removes_persisted_record() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(FileKeyValueStore::new(dir.path()));
        let mut store = HistoryStore::open(storage.clone());
        store.append("https://a").unwrap();
        assert!(storage.path_for(HISTORY_KEY).exists());

        store.clear().unwrap();
        assert!(store.list().is_empty());
        assert!(!storage.path_for(HISTORY_KEY).exists());
        assert_eq!(storage.get_item(HISTORY_KEY).unwrap(), None);
    }

    /// Reads work; every write is refused.
    struct ReadOnlyStore(MemoryKeyValueStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get_item(&self, key: &str) -> std::io::Result<Option<String>> {
            self.0.get_item(key)
        }
        fn set_item(&self, _key: &str, _value: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
        }
        fn remove_item(&self, _key: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    fn read_only_with(urls: usize) -> HistoryStore {
        let seeded = memory();
        let mut store = HistoryStore::open(seeded.clone());
        for i in 0..urls {
            store.append(&format!("https://link/{}", i)).unwrap();
        }
        let raw = seeded.get_item(HISTORY_KEY).unwrap().unwrap();
        let inner = MemoryKeyValueStore::new();
        inner.set_item(HISTORY_KEY, &raw).unwrap();
        HistoryStore::open(Arc::new(ReadOnlyStore(inner)))
    }

    #[test]
    fn failed_append_leaves_history_unchanged() {
        let mut store = read_only_with(MAX_ENTRIES);
        let before = store.list().to_vec();

        let result = store.append("https://new");
        assert!(matches!(result, Err(HistoryError::Persist(_))));
        assert_eq!(store.list(), before.as_slice());
        assert_eq!(store.list()[MAX_ENTRIES - 1].url, "https://link/0");
    }

    #[test]
    fn failed_remove_and_clear_leave_history_unchanged() {
        let mut store = read_only_with(2);
        let before = store.list().to_vec();

        assert!(store.remove(&before[0].id).is_err());
        assert_eq!(store.list(), before.as_slice());

        assert!(store.clear().is_err());
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn serialized_shape_uses_date_field() {
        let storage = memory();
        let mut store = HistoryStore::open(storage.clone());
        store.append("https://a").unwrap();

        let raw = storage.get_item(HISTORY_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &json[0];
        assert!(first["id"].is_string());
        assert_eq!(first["url"], "https://a");
        assert!(first["date"].as_str().unwrap().contains(", "));
    }
}
