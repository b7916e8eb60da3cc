//! # Durable Snapshot Storage
//!
//! The connector registry and the controller checkpoint must survive a
//! controller restart. Both persist a whole snapshot on every mutation through
//! [`SnapshotStore`]; [`JsonFileStore`] writes JSON files atomically and
//! [`InMemoryStore`] backs tests and embedders that bring their own storage.

use crate::error::{ControllerError, ControllerResult};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load/save of a complete snapshot of `T`
pub trait SnapshotStore<T>: Send + Sync {
    /// Load the last saved snapshot, `None` if nothing was saved yet
    fn load(&self) -> ControllerResult<Option<T>>;

    /// Replace the stored snapshot
    fn save(&self, value: &T) -> ControllerResult<()>;

    /// Human-readable location for logging
    fn location(&self) -> String;
}

/// JSON file store with write-then-rename replacement
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl<T> SnapshotStore<T> for JsonFileStore
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> ControllerResult<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| ControllerError::persistence(self.describe(), e))?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&contents)
            .map_err(|e| ControllerError::persistence(self.describe(), e))?;
        Ok(Some(value))
    }

    fn save(&self, value: &T) -> ControllerResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ControllerError::persistence(self.describe(), e))?;
            }
        }

        let contents = serde_json::to_string_pretty(value)?;
        let temp = self.temp_path();
        fs::write(&temp, contents).map_err(|e| ControllerError::persistence(self.describe(), e))?;
        fs::rename(&temp, &self.path)
            .map_err(|e| ControllerError::persistence(self.describe(), e))?;

        debug!(path = %self.path.display(), "Snapshot persisted");
        Ok(())
    }

    fn location(&self) -> String {
        self.describe()
    }
}

/// Process-local store
#[derive(Debug)]
pub struct InMemoryStore<T> {
    value: Mutex<Option<T>>,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> SnapshotStore<T> for InMemoryStore<T>
where
    T: Clone + Send + Sync,
{
    fn load(&self) -> ControllerResult<Option<T>> {
        Ok(self.value.lock().clone())
    }

    fn save(&self, value: &T) -> ControllerResult<()> {
        *self.value.lock() = Some(value.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_file_store_round_trip_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/state.json"));

        let loaded: Option<BTreeMap<String, u32>> = store.load().unwrap();
        assert!(loaded.is_none());

        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1u32);
        store.save(&value).unwrap();

        let loaded: Option<BTreeMap<String, u32>> = store.load().unwrap();
        assert_eq!(loaded, Some(value));
        assert!(!dir.path().join("nested/state.json.tmp").exists());
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        let result: ControllerResult<Option<BTreeMap<String, u32>>> = store.load();
        assert!(matches!(result, Err(ControllerError::Persistence { .. })));
    }

    #[test]
    fn test_file_store_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let path = blocker.join("state.json");
        let store: Box<dyn SnapshotStore<Vec<u32>>> = Box::new(JsonFileStore::new(&path));
        assert_eq!(store.location(), path.display().to_string());

        let result = store.save(&vec![1, 2]);
        assert!(matches!(
            result,
            Err(ControllerError::Persistence { path: ref reported, .. }) if *reported == path.display().to_string()
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = InMemoryStore::new();
        assert_eq!(store.load().unwrap(), None::<u32>);
        store.save(&7u32).unwrap();
        assert_eq!(store.load().unwrap(), Some(7));
    }
}
