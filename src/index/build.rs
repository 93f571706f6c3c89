//! Index building.
//!
//! [`build_location`] turns the rows of one location into its range index and
//! metadata table. [`Indexer`] wires that to a record source and the stores,
//! adds change detection, and runs over every configured location.

use std::time::SystemTime;

use super::error::{BuildError, IndexError, LocationFailure};
use super::freshness::{self, Freshness};
use super::meta::{IndexMeta, MetaStore};
use super::model::{BEGIN_FIELD, LocationIndex, RangeIndex, RangeMetadataTable, RangeRecord};
use super::store::ArtifactStore;
use crate::callnumber::{Normalize, canonicalize};
use crate::config::LocationConfig;
use crate::logger::ProgressLine;
use crate::source::{RawRecord, RecordSource, text_field};
use crate::utils::date::{display_millis, system_time_millis};
use crate::{debug, log};

/// Per-location counters from a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Rows read from the source.
    pub records: usize,
    /// Rows that made it into the index.
    pub indexed: usize,
    /// Rows without a `begin` value.
    pub blank_begin: usize,
    /// Rows whose `begin` could not be normalized.
    pub unnormalizable: usize,
    /// Rows whose range start was already present.
    pub duplicates: usize,
}

impl BuildStats {
    pub fn skipped(&self) -> usize {
        self.blank_begin + self.unnormalizable
    }
}

/// Build the index and metadata table of `location` from its rows.
///
/// Rows with a blank `begin`, or one the normalizer rejects, are skipped
/// with a warning. A range start seen twice stays twice in the index and
/// keeps the later row in the table. The index is sorted once at the end.
pub fn build_location(
    location: &str,
    records: impl IntoIterator<Item = RawRecord>,
    normalizer: &dyn Normalize,
) -> (LocationIndex, BuildStats) {
    let mut stats = BuildStats::default();
    let mut starts = Vec::new();
    let mut table = RangeMetadataTable::new();

    for row in records {
        stats.records += 1;

        let Some(begin) = text_field(&row, BEGIN_FIELD) else {
            stats.blank_begin += 1;
            log!("warning"; "{}: row {} has no begin range", location, stats.records);
            continue;
        };

        let canonical = match canonicalize(normalizer, &begin, location) {
            Ok(canonical) => canonical,
            Err(e) => {
                stats.unnormalizable += 1;
                log!("warning"; "{}: can't normalize {:?}: {}", location, begin, e);
                continue;
            }
        };

        if table.contains_key(&canonical) {
            stats.duplicates += 1;
            log!("warning"; "{}: duplicate range start {:?} ({})", location, canonical, begin);
        }

        starts.push(canonical.clone());
        table.insert(canonical.clone(), RangeRecord::from_source(row, &canonical));
        stats.indexed += 1;
    }

    (LocationIndex::new(RangeIndex::from(starts), table), stats)
}

/// What happened to one location during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationOutcome {
    Built { reason: Freshness, stats: BuildStats },
    Skipped,
}

/// Result of an indexing run over several locations.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub outcomes: Vec<(String, LocationOutcome)>,
    pub failures: Vec<LocationFailure>,
    /// Build time written to the bookkeeping record, if any.
    pub recorded: Option<SystemTime>,
    bookkeeping_error: Option<super::store::StoreError>,
}

impl BuildReport {
    pub fn built(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, LocationOutcome::Built { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.built()
    }

    /// Err if any location failed or the build time could not be recorded.
    pub fn into_result(self) -> Result<Self, BuildError> {
        if !self.failures.is_empty() {
            return Err(BuildError::Locations(self.failures));
        }
        if let Some(e) = self.bookkeeping_error {
            return Err(BuildError::Bookkeeping(e));
        }
        Ok(self)
    }
}

/// Builds and persists location indexes.
pub struct Indexer<'a> {
    source: &'a dyn RecordSource,
    normalizer: &'a dyn Normalize,
    store: &'a dyn ArtifactStore,
    meta: &'a dyn MetaStore,
}

impl<'a> Indexer<'a> {
    pub fn new(
        source: &'a dyn RecordSource,
        normalizer: &'a dyn Normalize,
        store: &'a dyn ArtifactStore,
        meta: &'a dyn MetaStore,
    ) -> Self {
        Self {
            source,
            normalizer,
            store,
            meta,
        }
    }

    /// Index every location and record the run's start time on success.
    ///
    /// Every location is attempted even after a failure. The build time is
    /// only recorded when no location failed.
    pub fn build_all(&self, locations: &[LocationConfig], force: bool) -> BuildReport {
        self.run(locations, force, true)
    }

    /// Index a subset of locations without touching the bookkeeping record.
    ///
    /// The recorded build time covers all locations, so a partial run must
    /// not advance it.
    pub fn build_some(&self, locations: &[LocationConfig], force: bool) -> BuildReport {
        self.run(locations, force, false)
    }

    fn run(&self, locations: &[LocationConfig], force: bool, record: bool) -> BuildReport {
        let started = SystemTime::now();
        let mut meta = self.load_meta();
        let last_build = meta.last_build();

        if let Some(last) = last_build {
            debug!("index"; "last build {}", display_millis(system_time_millis(last)));
        }

        let mut report = BuildReport::default();
        let progress = ProgressLine::new("index", &[("locations", locations.len())]);

        for location in locations {
            match self.index_location(location, last_build, force) {
                Ok(outcome) => report.outcomes.push((location.code.clone(), outcome)),
                Err(error) => {
                    log!("error"; "indexing {} failed: {}", location.code, error);
                    report.failures.push(LocationFailure {
                        location: location.code.clone(),
                        error,
                    });
                }
            }
            progress.inc("locations");
        }
        progress.finish();

        if record && report.failures.is_empty() {
            meta.set_last_build(started);
            match self.meta.save(&meta) {
                Ok(()) => report.recorded = Some(started),
                Err(e) => report.bookkeeping_error = Some(e),
            }
        }

        report
    }

    /// Rebuild one location unless its sheets are unchanged.
    pub fn index_location(
        &self,
        location: &LocationConfig,
        last_build: Option<SystemTime>,
        force: bool,
    ) -> Result<LocationOutcome, IndexError> {
        let code = location.code.as_str();
        let sheets = self.source.sheets(location)?;

        let reason = freshness::check(&sheets, last_build, self.store.contains(code), force);
        if !reason.needs_rebuild() {
            log!("index"; "skipping {}: no data changed", code);
            return Ok(LocationOutcome::Skipped);
        }
        debug!("index"; "indexing {} ({})", code, reason.describe());

        let mut rows = Vec::new();
        for sheet in &sheets {
            debug!("index"; "reading sheet {}", sheet.title);
            rows.extend(self.source.records(sheet)?);
        }

        let (data, stats) = build_location(code, rows, self.normalizer);
        self.store.save(code, &data)?;

        log!(
            "index";
            "{}: {} ranges from {} rows ({} skipped)",
            code,
            stats.indexed,
            stats.records,
            stats.skipped()
        );
        Ok(LocationOutcome::Built { reason, stats })
    }

    fn load_meta(&self) -> IndexMeta {
        self.meta.load().unwrap_or_else(|e| {
            log!("warning"; "unreadable build record, rebuilding everything: {}", e);
            IndexMeta::default()
        })
    }
}
