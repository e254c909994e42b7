//! Snapshot persistence
//!
//! A snapshot is the single persisted record of an editing session:
//! `{title, author, content}` as JSON under one fixed key. The `content`
//! string is opaque here; the editor decides how a document is encoded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{KeyValueStore, StorageError};

/// Key the snapshot is stored under unless configured otherwise
pub const DEFAULT_DOCUMENT_KEY: &str = "richtext.document";

/// The persisted record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub content: String,
}

impl Snapshot {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Stored value exists but cannot be parsed
    #[error("Stored snapshot is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to serialize snapshot: {0}")]
    SerializationFailed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Serializes a snapshot to JSON bytes
pub fn serialize_snapshot(snapshot: &Snapshot) -> PersistenceResult<Vec<u8>> {
    serde_json::to_vec(snapshot).map_err(|e| PersistenceError::SerializationFailed(e.to_string()))
}

/// Deserializes a snapshot from JSON bytes
pub fn deserialize_snapshot(bytes: &[u8]) -> PersistenceResult<Snapshot> {
    serde_json::from_slice(bytes).map_err(|e| PersistenceError::Corrupt(e.to_string()))
}

/// Saves and restores the snapshot through a key-value store
#[derive(Debug)]
pub struct PersistenceStore<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> PersistenceStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_DOCUMENT_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Writes the snapshot, overwriting any prior value
    pub fn save(&mut self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let bytes = serialize_snapshot(snapshot)?;
        self.store.set(&self.key, &bytes)?;
        Ok(())
    }

    /// Reads the snapshot; `Ok(None)` when nothing has been saved
    pub fn load(&self) -> PersistenceResult<Option<Snapshot>> {
        match self.store.get(&self.key)? {
            Some(bytes) => deserialize_snapshot(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Removes the stored snapshot
    pub fn clear(&mut self) -> PersistenceResult<()> {
        self.store.delete(&self.key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failing_store::{FailingStore, FailurePolicy};
    use crate::store::{FileStore, MemoryStore};

    #[test]
    fn test_load_empty_store() {
        let store = PersistenceStore::new(MemoryStore::new());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        let snapshot = Snapshot::new("Notes", "Ada", "{\"blocks\":[]}");
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_save_overwrites() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        store.save(&Snapshot::new("a", "", "1")).unwrap();
        store.save(&Snapshot::new("b", "", "2")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().title, "b");
        assert_eq!(store.store().len(), 1);
    }

    #[test]
    fn test_corrupt_value() {
        let mut memory = MemoryStore::new();
        memory.set(DEFAULT_DOCUMENT_KEY, b"not json at all").unwrap();
        let store = PersistenceStore::new(memory);
        assert!(matches!(store.load(), Err(PersistenceError::Corrupt(_))));
    }

    #[test]
    fn test_missing_title_and_author_default() {
        let mut memory = MemoryStore::new();
        memory
            .set(DEFAULT_DOCUMENT_KEY, br#"{"content":"x"}"#)
            .unwrap();
        let store = PersistenceStore::new(memory);
        assert_eq!(store.load().unwrap(), Some(Snapshot::new("", "", "x")));
    }

    #[test]
    fn test_clear() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        store.save(&Snapshot::new("t", "a", "c")).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_custom_key() {
        let mut store = PersistenceStore::with_key(MemoryStore::new(), "other");
        store.save(&Snapshot::default()).unwrap();
        assert!(store.store().contains("other"));
        assert!(!store.store().contains(DEFAULT_DOCUMENT_KEY));
    }

    #[test]
    fn test_failed_save_keeps_previous() {
        let failing = FailingStore::new(MemoryStore::new(), FailurePolicy::AfterWrites(1));
        let mut store = PersistenceStore::new(failing);
        store.save(&Snapshot::new("first", "", "")).unwrap();
        let err = store.save(&Snapshot::new("second", "", "")).unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(StorageError::Full)));
        assert_eq!(store.load().unwrap().unwrap().title, "first");
    }

    #[test]
    fn test_file_backed_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::new("On disk", "Grace", "body");
        {
            let mut store = PersistenceStore::new(FileStore::open(dir.path()).unwrap());
            store.save(&snapshot).unwrap();
        }
        let store = PersistenceStore::new(FileStore::open(dir.path()).unwrap());
        assert_eq!(store.load().unwrap(), Some(snapshot));
    }
}
