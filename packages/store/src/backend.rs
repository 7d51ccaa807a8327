#![allow(clippy::module_name_repetitions)]
//! Raw-document persistence backends.
//!
//! A backend stores exactly one serialized document; [`crate::KvStore`]
//! handles serialization, locking, and reconciliation above this seam, so
//! swapping file storage for anything else is a matter of implementing
//! [`StateBackend`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::StoreError;

/// Where a store's serialized document lives.
pub trait StateBackend: Send + Sync {
    /// Reads the persisted document, or `None` if none has been written yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a document exists but cannot be read.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Durably replaces the persisted document.
    ///
    /// A crash mid-persist must leave the previous document intact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document cannot be written.
    fn persist(&self, document: &str) -> Result<(), StoreError>;
}

/// File-backed persistence: one JSON document per store.
///
/// Writes go to a `.tmp` sibling first and are renamed over the target, so
/// an interrupted persist never corrupts the existing document.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StateBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn persist(&self, document: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, document)?;
        std::fs::rename(&tmp_path, &self.path)?;
        log::debug!("Persisted {}", self.path.display());
        Ok(())
    }
}

/// In-memory persistence for tests and ephemeral runs.
///
/// Clones share the same document, so a store reloaded from a clone of the
/// backend sees everything the original persisted.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    document: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last persisted document, if any.
    #[must_use]
    pub fn document(&self) -> Option<String> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.document())
    }

    fn persist(&self, document: &str) -> Result<(), StoreError> {
        *self
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(document.to_string());
        Ok(())
    }
}
