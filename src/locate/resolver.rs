//! Per-call lookups that read a location's artifacts from storage.

use super::result::{LocateResult, NotLocatedReason};
use super::search::locate_in;
use crate::callnumber::{Normalize, canonicalize};
use crate::index::{ArtifactStore, is_valid_location_code};
use crate::{debug, log};

/// Lookup key for a user-supplied location.
pub fn location_key(location: &str) -> String {
    location.trim().to_lowercase()
}

/// Canonical call number for a lookup, or the reason there is none.
pub(crate) fn query_key(
    normalizer: &dyn Normalize,
    call_number: &str,
    location: &str,
) -> Result<String, NotLocatedReason> {
    canonicalize(normalizer, call_number, location).map_err(|e| {
        debug!("locate"; "can't normalize {:?} for {}: {}", call_number, location, e);
        NotLocatedReason::Unnormalizable
    })
}

/// One-shot lookups that read the location's artifacts on every call.
pub struct Resolver<'a> {
    normalizer: &'a dyn Normalize,
    store: &'a dyn ArtifactStore,
}

impl<'a> Resolver<'a> {
    pub fn new(normalizer: &'a dyn Normalize, store: &'a dyn ArtifactStore) -> Self {
        Self { normalizer, store }
    }

    pub fn resolve(&self, call_number: &str, location: &str) -> LocateResult {
        let location = location_key(location);

        let canonical = match query_key(self.normalizer, call_number, &location) {
            Ok(canonical) => canonical,
            Err(reason) => return LocateResult::not_located(location, reason),
        };

        if !is_valid_location_code(&location) {
            debug!("locate"; "rejecting location {:?}", location);
            return LocateResult::not_located(location, NotLocatedReason::NoIndex);
        }

        match self.store.load(&location) {
            Ok(Some(data)) => locate_in(&data, &canonical, &location),
            Ok(None) => {
                log!("error"; "no index for {}", location);
                LocateResult::not_located(location, NotLocatedReason::NoIndex)
            }
            Err(e) => {
                log!("error"; "can't load index for {}: {}", location, e);
                LocateResult::not_located(location, NotLocatedReason::NoIndex)
            }
        }
    }
}
