//! In-memory lookups over every configured location.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::resolver::{location_key, query_key};
use super::result::{LocateResult, NotLocatedReason};
use super::search::locate_in;
use crate::callnumber::Normalize;
use crate::index::{ArtifactStore, LocationIndex};
use crate::{debug, log};

/// Loaded index/metadata pairs keyed by location code.
///
/// Built once and never touches storage afterwards. Locations that failed
/// to load are absent and answer `no_index`.
pub struct LocationCache {
    normalizer: Arc<dyn Normalize>,
    locations: FxHashMap<String, LocationIndex>,
}

impl LocationCache {
    /// Load every location in `codes` from `store`.
    pub fn load<'c>(
        codes: impl IntoIterator<Item = &'c str>,
        store: &dyn ArtifactStore,
        normalizer: Arc<dyn Normalize>,
    ) -> Self {
        let mut locations = FxHashMap::default();

        for code in codes {
            let code = location_key(code);
            match store.load(&code) {
                Ok(Some(data)) => {
                    debug!("locate"; "loaded {} ranges for {}", data.index.len(), code);
                    let uncovered = data.uncovered().len();
                    if uncovered > 0 {
                        log!("warning"; "{}: {} range starts have no metadata", code, uncovered);
                    }
                    locations.insert(code, data);
                }
                Ok(None) => log!("error"; "no index for {}, run `locator index` first", code),
                Err(e) => log!("error"; "can't load index for {}: {}", code, e),
            }
        }

        Self {
            normalizer,
            locations,
        }
    }

    pub fn resolve(&self, call_number: &str, location: &str) -> LocateResult {
        let location = location_key(location);

        let canonical = match query_key(self.normalizer.as_ref(), call_number, &location) {
            Ok(canonical) => canonical,
            Err(reason) => return LocateResult::not_located(location, reason),
        };

        match self.locations.get(&location) {
            Some(data) => locate_in(data, &canonical, &location),
            None => {
                debug!("locate"; "location {} not loaded", location);
                LocateResult::not_located(location, NotLocatedReason::NoIndex)
            }
        }
    }

    /// Codes of the loaded locations, sorted.
    pub fn locations(&self) -> Vec<&str> {
        let mut codes: Vec<_> = self.locations.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callnumber::{LcNormalizer, LiteralNormalizer, Scheme, SchemeNormalizer};
    use crate::index::{JsonArtifactStore, MemoryArtifactStore, build_location};
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    fn rows(value: Value) -> Vec<crate::source::RawRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_cache_is_shareable() {
        assert_send_sync::<LocationCache>();
    }

    #[test]
    fn test_cache_matches_resolver() {
        let store = MemoryArtifactStore::new();
        let (rock, _) = build_location(
            "rock",
            rows(json!([
                {"begin": "PS3568.U8", "aisle": "12A", "floor": "3"},
                {"begin": "QA76.73", "aisle": "14B", "floor": "3"},
            ])),
            &LcNormalizer,
        );
        store.insert("rock", rock);

        let cache = LocationCache::load(["rock", "sci"], &store, Arc::new(LcNormalizer));
        let resolver = super::super::Resolver::new(&LcNormalizer, &store);

        assert_eq!(cache.locations(), ["rock"]);
        for query in ["PS3575.Z9", "QA76.73", "Z1", "AA1", ""] {
            assert_eq!(cache.resolve(query, "Rock"), resolver.resolve(query, "Rock"));
        }
        assert_eq!(
            cache.resolve("PS3575.Z9", "sci").reason,
            Some(NotLocatedReason::NoIndex)
        );
    }

    #[test]
    fn test_cache_skips_broken_locations() {
        let dir = TempDir::new().unwrap();
        let store = JsonArtifactStore::new(dir.path());
        let (annex, _) = build_location(
            "annex",
            rows(json!([{"begin": "box 1", "aisle": "1A"}, {"begin": "box 5", "aisle": "2B"}])),
            &LiteralNormalizer,
        );
        store.save("annex", &annex).unwrap();
        store.save("sci", &annex).unwrap();
        fs::write(store.index_path("sci"), "not json").unwrap();

        let normalizer = SchemeNormalizer::new([("annex", Scheme::Literal)]);
        let cache = LocationCache::load(["annex", "sci"], &store, Arc::new(normalizer));

        assert_eq!(cache.locations(), ["annex"]);
        assert_eq!(cache.resolve("BOX 3", "annex").aisle.as_deref(), Some("1A"));
        assert_eq!(cache.resolve("box 7", "annex").side.as_deref(), Some("B"));
        assert_eq!(
            cache.resolve("QA1", "sci").reason,
            Some(NotLocatedReason::NoIndex)
        );
    }
}
