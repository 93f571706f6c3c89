//! Persistence of per-location index artifacts.
//!
//! Each location is stored as two JSON files in the data directory:
//! `<code>_index.json` (sorted range starts) and `<code>_meta.json`
//! (range start -> record). Each file is replaced atomically: written to a
//! temporary file in the same directory, then renamed over the old one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[cfg(test)]
use parking_lot::Mutex;
#[cfg(test)]
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::model::{LocationIndex, RangeIndex, RangeMetadataTable};
use crate::utils::mtime::get_mtime;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("corrupt artifact `{0}`")]
    Corrupt(PathBuf, #[source] serde_json::Error),

    #[error("incomplete artifacts for `{location}`: {missing} is missing")]
    Incomplete {
        location: String,
        missing: &'static str,
    },
}

/// Storage for the index/metadata pair of each location.
pub trait ArtifactStore: Send + Sync {
    /// Replace the stored pair for `location`.
    fn save(&self, location: &str, data: &LocationIndex) -> Result<(), StoreError>;

    /// Load the pair for `location`; `Ok(None)` when it was never built.
    fn load(&self, location: &str) -> Result<Option<LocationIndex>, StoreError>;

    /// Whether a pair for `location` exists.
    fn contains(&self, location: &str) -> bool;

    /// When the pair for `location` was last replaced, if known.
    ///
    /// Changes on every save, so readers holding a loaded pair can tell it
    /// went stale.
    fn modified(&self, location: &str) -> Option<SystemTime>;
}

// ============================================================================
// JSON files
// ============================================================================

#[derive(Debug, Clone)]
pub struct JsonArtifactStore {
    dir: PathBuf,
}

impl JsonArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn index_path(&self, location: &str) -> PathBuf {
        self.dir.join(format!("{location}_index.json"))
    }

    pub fn meta_path(&self, location: &str) -> PathBuf {
        self.dir.join(format!("{location}_meta.json"))
    }
}

impl ArtifactStore for JsonArtifactStore {
    fn save(&self, location: &str, data: &LocationIndex) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(self.dir.clone(), e))?;

        // Metadata lands before the index that references it.
        write_atomic(&self.meta_path(location), &data.table)?;
        write_atomic(&self.index_path(location), &data.index)?;

        crate::debug!("store"; "saved {} ranges for {}", data.index.len(), location);
        Ok(())
    }

    fn load(&self, location: &str) -> Result<Option<LocationIndex>, StoreError> {
        let index_path = self.index_path(location);
        let meta_path = self.meta_path(location);

        match (index_path.exists(), meta_path.exists()) {
            (false, false) => Ok(None),
            (true, false) => Err(StoreError::Incomplete {
                location: location.to_string(),
                missing: "metadata",
            }),
            (false, true) => Err(StoreError::Incomplete {
                location: location.to_string(),
                missing: "index",
            }),
            (true, true) => {
                let index: RangeIndex = read_json(&index_path)?;
                let table: RangeMetadataTable = read_json(&meta_path)?;
                Ok(Some(LocationIndex::new(index, table)))
            }
        }
    }

    fn contains(&self, location: &str) -> bool {
        self.index_path(location).exists() && self.meta_path(location).exists()
    }

    fn modified(&self, location: &str) -> Option<SystemTime> {
        // the index is written last
        get_mtime(&self.index_path(location))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&content).map_err(|e| StoreError::Corrupt(path.to_path_buf(), e))
}

/// Serialize `value` next to `path` and rename it into place.
pub(crate) fn write_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_vec(value).map_err(|e| StoreError::Corrupt(path.to_path_buf(), e))?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::Io(dir.to_path_buf(), e))?;
    tmp.write_all(&json)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StoreError::Io(tmp.path().to_path_buf(), e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::Io(path.to_path_buf(), e.error))?;
    Ok(())
}

// ============================================================================
// In memory
// ============================================================================

/// Store kept entirely in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    entries: Mutex<FxHashMap<String, (LocationIndex, SystemTime)>>,
    saves: Mutex<Vec<String>>,
    clock: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locations saved so far, in save order.
    pub fn saves(&self) -> Vec<String> {
        self.saves.lock().clone()
    }

    pub fn insert(&self, location: &str, data: LocationIndex) {
        let stamp = self.tick();
        self.entries.lock().insert(location.to_string(), (data, stamp));
    }

    /// Strictly increasing stamps, one per write.
    fn tick(&self) -> SystemTime {
        let n = self.clock.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        std::time::UNIX_EPOCH + std::time::Duration::from_millis(n + 1)
    }
}

#[cfg(test)]
impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, location: &str, data: &LocationIndex) -> Result<(), StoreError> {
        self.insert(location, data.clone());
        self.saves.lock().push(location.to_string());
        Ok(())
    }

    fn load(&self, location: &str) -> Result<Option<LocationIndex>, StoreError> {
        Ok(self.entries.lock().get(location).map(|(data, _)| data.clone()))
    }

    fn contains(&self, location: &str) -> bool {
        self.entries.lock().contains_key(location)
    }

    fn modified(&self, location: &str) -> Option<SystemTime> {
        self.entries.lock().get(location).map(|(_, stamp)| *stamp)
    }
}
