//! Bundled key-value backends for [`KeyValueStorage`].
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::KeyValueStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage is rejecting writes")]
    WritesDisabled,
}

/// In-process storage. Clones share the same map, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
    reject_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_item`/`remove_item` fail until reset.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing deserialization.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Seed a raw value, e.g. a record written by an older build.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            Err(StorageError::WritesDisabled)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    type Error = StorageError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.check_writable()?;
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        self.check_writable()?;
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// One JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key has no usable characters.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if name.trim_matches(|c| c == '_' || c == '.').is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{name}.json")))
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KeyValueStorage for FileStorage {
    type Error = StorageError;

    fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(&path)(err)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        // Rename over the target so readers never see a half-written record.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(io_err(&staging))?;
        fs::rename(&staging, &path).map_err(io_err(&path))
    }

    fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(&path)(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_clones_share_items() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.set_item("k", "v").unwrap();
        assert_eq!(handle.get_item("k").unwrap().as_deref(), Some("v"));
        handle.remove_item("k").unwrap();
        assert!(storage.get_item("k").unwrap().is_none());
    }

    #[test]
    fn memory_storage_can_reject_writes() {
        let storage = MemoryStorage::new();
        storage.insert_raw("k", "old");
        storage.reject_writes(true);
        assert!(matches!(
            storage.set_item("k", "new"),
            Err(StorageError::WritesDisabled)
        ));
        assert!(storage.remove_item("k").is_err());
        assert_eq!(storage.raw("k").as_deref(), Some("old"));
        storage.reject_writes(false);
        storage.set_item("k", "new").unwrap();
        assert_eq!(storage.raw("k").as_deref(), Some("new"));
    }

    #[test]
    fn file_storage_round_trips_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("data"));
        assert!(storage.get_item("@pet_care_game:pet").unwrap().is_none());
        storage.remove_item("@pet_care_game:pet").unwrap();

        storage.set_item("@pet_care_game:pet", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get_item("@pet_care_game:pet").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        let path = storage.path_for("@pet_care_game:pet").unwrap();
        assert!(path.ends_with("_pet_care_game_pet.json"));
        assert!(!path.with_extension("json.tmp").exists());

        storage.remove_item("@pet_care_game:pet").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn file_storage_rejects_unusable_keys() {
        let storage = FileStorage::new("unused");
        assert!(matches!(
            storage.path_for("@:/"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(storage.path_for("..").is_err());
    }
}
