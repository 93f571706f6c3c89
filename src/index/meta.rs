//! Build bookkeeping: when the last complete indexing run happened.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::store::{StoreError, write_atomic};
use crate::utils::date::system_time_millis;

/// Key-value bookkeeping record.
///
/// `updated` is the start of the last run in which every location was
/// either rebuilt or found unchanged, in Unix milliseconds. Other keys are
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl IndexMeta {
    pub fn last_build(&self) -> Option<SystemTime> {
        self.updated
            .map(|millis| UNIX_EPOCH + Duration::from_millis(millis))
    }

    pub fn set_last_build(&mut self, time: SystemTime) {
        self.updated = Some(system_time_millis(time));
    }
}

/// Load/save of the bookkeeping record.
pub trait MetaStore: Send + Sync {
    /// The stored record, or an empty one if none exists yet.
    fn load(&self) -> Result<IndexMeta, StoreError>;

    fn save(&self, meta: &IndexMeta) -> Result<(), StoreError>;
}

/// Bookkeeping kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonMetaStore {
    path: PathBuf,
}

impl JsonMetaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetaStore for JsonMetaStore {
    fn load(&self) -> Result<IndexMeta, StoreError> {
        if !self.path.exists() {
            return Ok(IndexMeta::default());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| StoreError::Io(self.path.clone(), e))?;
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt(self.path.clone(), e))
    }

    fn save(&self, meta: &IndexMeta) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(parent.to_path_buf(), e))?;
        }
        write_atomic(&self.path, meta)
    }
}

/// Bookkeeping held in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryMetaStore {
    meta: parking_lot::Mutex<IndexMeta>,
    saves: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MemoryMetaStore {
    pub fn with_last_build(time: SystemTime) -> Self {
        let mut meta = IndexMeta::default();
        meta.set_last_build(time);
        Self {
            meta: parking_lot::Mutex::new(meta),
            saves: Default::default(),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl MetaStore for MemoryMetaStore {
    fn load(&self) -> Result<IndexMeta, StoreError> {
        Ok(self.meta.lock().clone())
    }

    fn save(&self, meta: &IndexMeta) -> Result<(), StoreError> {
        *self.meta.lock() = meta.clone();
        self.saves.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_meta() {
        let dir = TempDir::new().unwrap();
        let store = JsonMetaStore::new(dir.path().join(".meta.json"));
        assert_eq!(store.load().unwrap(), IndexMeta::default());
        assert_eq!(store.load().unwrap().last_build(), None);
    }

    #[test]
    fn test_roundtrip_keeps_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join(".meta.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"updated": 1000, "operator": "nightly"}"#).unwrap();

        let store = JsonMetaStore::new(&path);
        let mut meta = store.load().unwrap();
        assert_eq!(meta.last_build(), Some(UNIX_EPOCH + Duration::from_secs(1)));

        meta.set_last_build(UNIX_EPOCH + Duration::from_millis(2500));
        store.save(&meta).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.updated, Some(2500));
        assert_eq!(reloaded.extra["operator"], "nightly");
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let store = JsonMetaStore::new(dir.path().join("nested").join(".meta.json"));
        store.save(&IndexMeta::default()).unwrap();
        assert_eq!(store.load().unwrap(), IndexMeta::default());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".meta.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonMetaStore::new(&path).load(),
            Err(StoreError::Corrupt(..))
        ));
    }
}
