//! Range index construction and persistence.
//!
//! # Layout
//!
//! ```text
//! <data dir>/
//! ├── .meta.json          # last complete build (Unix millis)
//! ├── rock_index.json     # ["P   0001", "PS  3568 U8", ...]
//! └── rock_meta.json      # {"PS  3568 U8": {"aisle": "12A", ...}, ...}
//! ```

mod build;
mod error;
mod freshness;
mod meta;
mod model;
mod store;

pub use build::{BuildReport, Indexer, LocationOutcome, build_location};
pub use meta::{IndexMeta, JsonMetaStore, MetaStore};
pub use model::{
    LocationIndex, RangeIndex, RangeMetadataTable, RangeRecord, is_valid_location_code,
};
pub use store::{ArtifactStore, JsonArtifactStore, StoreError};

#[cfg(test)]
pub use store::MemoryArtifactStore;
