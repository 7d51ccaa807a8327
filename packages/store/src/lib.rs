#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Durable key-value stores for fogo-watch state.
//!
//! Two documents back the whole system: `users.json` (subscriber id →
//! chosen district) and `incidents.json` (incident id → last-seen record,
//! the diff baseline). Each is loaded once at startup, held in memory
//! behind a mutex, and flushed wholesale, never merged incrementally.

pub mod backend;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use fogo_watch_incident_models::{District, Incident};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use backend::{JsonFileBackend, MemoryBackend, StateBackend};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be serialized or parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Subscriber id → chosen district.
pub type PreferenceStore = KvStore<District>;

/// Incident id → last-seen record; the baseline every cycle diffs against.
pub type SnapshotStore = KvStore<Incident>;

/// File name of the subscriber preference document.
pub const PREFERENCES_FILE: &str = "users.json";

/// File name of the incident snapshot document.
pub const SNAPSHOT_FILE: &str = "incidents.json";

/// A guarded in-memory map with whole-document durable persistence.
///
/// All access goes through one mutex, so the periodic cycle and command
/// handlers can share a store freely. [`KvStore::flush`] serializes the full
/// map and hands it to the injected [`StateBackend`]; there are no partial
/// writes to reason about.
pub struct KvStore<V> {
    backend: Box<dyn StateBackend>,
    entries: Mutex<BTreeMap<String, V>>,
}

impl<V> KvStore<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Opens the store, reconciling the backend's persisted document into
    /// memory. A missing document yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a document exists but cannot be read or
    /// parsed. A corrupt document is never silently discarded; starting
    /// empty would re-notify every tracked incident and drop every
    /// subscription.
    pub fn load(backend: Box<dyn StateBackend>) -> Result<Self, StoreError> {
        let entries = match backend.load()? {
            Some(document) => serde_json::from_str(&document)?,
            None => BTreeMap::new(),
        };
        Ok(Self {
            backend,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: V) {
        self.lock().insert(key.to_string(), value);
    }

    /// Returns a point-in-time copy of every entry, so callers can iterate
    /// without holding the lock.
    #[must_use]
    pub fn all(&self) -> BTreeMap<String, V> {
        self.lock().clone()
    }

    /// Replaces the entire contents; keys absent from `entries` are dropped.
    pub fn replace_all(&self, entries: BTreeMap<String, V>) {
        *self.lock() = entries;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serializes the in-memory state and persists it through the backend.
    ///
    /// The lock is held across the backend write, so two concurrent flushes
    /// cannot persist out of order and regress the durable copy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the backend write fails.
    /// The in-memory state is untouched either way, so a later flush
    /// retries from the same state.
    pub fn flush(&self) -> Result<(), StoreError> {
        let entries = self.lock();
        let document = serde_json::to_string_pretty(&*entries)?;
        self.backend.persist(&document)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Opens the preference store backed by [`PREFERENCES_FILE`] under
/// `data_dir`.
///
/// # Errors
///
/// Returns [`StoreError`] if an existing document cannot be read or parsed.
pub fn open_preferences(data_dir: &Path) -> Result<PreferenceStore, StoreError> {
    let path = data_dir.join(PREFERENCES_FILE);
    let store = KvStore::load(Box::new(JsonFileBackend::new(path.clone())))?;
    log::info!(
        "Loaded {} subscriber preference(s) from {}",
        store.len(),
        path.display()
    );
    Ok(store)
}

/// Opens the snapshot store backed by [`SNAPSHOT_FILE`] under `data_dir`.
///
/// # Errors
///
/// Returns [`StoreError`] if an existing document cannot be read or parsed.
pub fn open_snapshot(data_dir: &Path) -> Result<SnapshotStore, StoreError> {
    let path = data_dir.join(SNAPSHOT_FILE);
    let store = KvStore::load(Box::new(JsonFileBackend::new(path.clone())))?;
    log::info!(
        "Loaded {} tracked incident(s) from {}",
        store.len(),
        path.display()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident(id: &str, district: District) -> Incident {
        Incident {
            id: id.to_string(),
            district,
            location: "Serra de Monchique".to_string(),
            locality: String::new(),
            parish: String::new(),
            municipality: String::new(),
            date: "2025-08-01".to_string(),
            hour: "10:00".to_string(),
            man: 30,
            terrain: 8,
            aerial: 2,
            status: "Em Curso".to_string(),
        }
    }

    #[test]
    fn set_get_all() {
        let store: PreferenceStore = KvStore::load(Box::new(MemoryBackend::new())).unwrap();
        assert!(store.is_empty());

        store.set("100", District::Porto);
        store.set("200", District::Todos);

        assert_eq!(store.get("100"), Some(District::Porto));
        assert_eq!(store.get("300"), None);
        assert_eq!(store.len(), 2);

        let all = store.all();
        assert_eq!(all.get("200"), Some(&District::Todos));
    }

    #[test]
    fn set_overwrites_existing_key() {
        let store: PreferenceStore = KvStore::load(Box::new(MemoryBackend::new())).unwrap();
        store.set("100", District::Porto);
        store.set("100", District::Faro);
        assert_eq!(store.get("100"), Some(District::Faro));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_all_drops_missing_keys() {
        let store: SnapshotStore = KvStore::load(Box::new(MemoryBackend::new())).unwrap();
        store.set("1", incident("1", District::Faro));
        store.set("2", incident("2", District::Porto));

        let mut next = BTreeMap::new();
        next.insert("2".to_string(), incident("2", District::Porto));
        store.replace_all(next);

        assert_eq!(store.get("1"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn flush_reload_roundtrip() {
        let backend = MemoryBackend::new();
        let store: PreferenceStore = KvStore::load(Box::new(backend.clone())).unwrap();
        store.set("100", District::VianaDoCastelo);
        store.set("200", District::Acores);
        store.flush().unwrap();

        let reloaded: PreferenceStore = KvStore::load(Box::new(backend)).unwrap();
        assert_eq!(reloaded.get("100"), Some(District::VianaDoCastelo));
        assert_eq!(reloaded.get("200"), Some(District::Acores));
    }

    #[test]
    fn preference_document_uses_official_names() {
        let backend = MemoryBackend::new();
        let store: PreferenceStore = KvStore::load(Box::new(backend.clone())).unwrap();
        store.set("100", District::Braganca);
        store.flush().unwrap();

        let document = backend.document().unwrap();
        assert!(document.contains("\"Bragança\""), "document: {document}");
    }

    #[test]
    fn snapshot_store_roundtrips_incidents() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_snapshot(dir.path()).unwrap();
        let inc = incident("9001", District::CasteloBranco);
        store.set("9001", inc.clone());
        store.flush().unwrap();

        let reloaded = open_snapshot(dir.path()).unwrap();
        assert_eq!(reloaded.get("9001"), Some(inc));
    }

    #[test]
    fn missing_documents_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_preferences(dir.path()).unwrap().is_empty());
        assert!(open_snapshot(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn corrupt_document_is_a_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PREFERENCES_FILE), "not json").unwrap();
        let Err(err) = open_preferences(dir.path()) else {
            panic!("corrupt document must not load");
        };
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[test]
    fn flush_failure_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let store = open_preferences(&data_dir).unwrap();
        store.set("100", District::Leiria);

        // Turn the data directory into a plain file so the flush cannot land.
        std::fs::remove_dir_all(&data_dir).unwrap();
        std::fs::write(&data_dir, "file, not dir").unwrap();

        assert!(store.flush().is_err());
        assert_eq!(store.get("100"), Some(District::Leiria));
    }
}
