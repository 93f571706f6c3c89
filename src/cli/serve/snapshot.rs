//! Swappable lookup state for the server.
//!
//! Request threads read the current [`Snapshot`] without locking. The
//! reload thread builds a complete replacement off to the side and swaps it
//! in, so a request sees one generation of the indexes from start to end.
//!
//! A reload happens when the recorded build time moves, or when any
//! location's artifacts were replaced since they were loaded (a partial
//! `locator index LOCATION...` run records no build time).

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::callnumber::Normalize;
use crate::index::{ArtifactStore, MetaStore};
use crate::locate::LocationCache;
use crate::{debug, log};

/// Indexes loaded from one build.
pub struct Snapshot {
    pub cache: LocationCache,
    /// Build time the indexes were loaded under (Unix millis).
    pub updated: Option<u64>,
    /// Artifact modification stamps read before loading, one per location.
    pub stamps: Vec<Option<SystemTime>>,
}

pub struct Snapshots {
    current: ArcSwap<Snapshot>,
    codes: Vec<String>,
    normalizer: Arc<dyn Normalize>,
    store: Box<dyn ArtifactStore>,
    meta: Box<dyn MetaStore>,
}

impl Snapshots {
    /// Load the first snapshot.
    pub fn load(
        codes: Vec<String>,
        normalizer: Arc<dyn Normalize>,
        store: Box<dyn ArtifactStore>,
        meta: Box<dyn MetaStore>,
    ) -> Self {
        let updated = read_updated(meta.as_ref()).unwrap_or_default();
        let stamps = read_stamps(&codes, store.as_ref());
        let cache = LocationCache::load(
            codes.iter().map(String::as_str),
            store.as_ref(),
            Arc::clone(&normalizer),
        );
        Self {
            current: ArcSwap::from_pointee(Snapshot {
                cache,
                updated,
                stamps,
            }),
            codes,
            normalizer,
            store,
            meta,
        }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Reload every location if the recorded build time moved or any
    /// location's artifacts were replaced.
    ///
    /// Returns true when a new snapshot was swapped in. An unreadable build
    /// record keeps the current snapshot.
    pub fn reload_if_changed(&self) -> bool {
        let Some(updated) = read_updated(self.meta.as_ref()) else {
            return false;
        };
        let stamps = read_stamps(&self.codes, self.store.as_ref());
        {
            let current = self.current.load();
            if updated == current.updated && stamps == current.stamps {
                return false;
            }
            if updated == current.updated {
                debug!("serve"; "artifacts replaced without a recorded build");
            }
        }

        let cache = LocationCache::load(
            self.codes.iter().map(String::as_str),
            self.store.as_ref(),
            Arc::clone(&self.normalizer),
        );
        log!("serve"; "reloaded {} location(s)", cache.locations().len());
        self.current.store(Arc::new(Snapshot {
            cache,
            updated,
            stamps,
        }));
        true
    }
}

fn read_stamps(codes: &[String], store: &dyn ArtifactStore) -> Vec<Option<SystemTime>> {
    codes.iter().map(|code| store.modified(code)).collect()
}

/// `None` when the record can't be read, `Some(None)` when nothing is recorded.
fn read_updated(meta: &dyn MetaStore) -> Option<Option<u64>> {
    match meta.load() {
        Ok(meta) => Some(meta.updated),
        Err(e) => {
            log!("warning"; "can't read build record: {}", e);
            debug!("serve"; "keeping current indexes");
            None
        }
    }
}
