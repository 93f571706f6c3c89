//! Range index data model.
//!
//! A location is described by two structures built together from the same
//! rows: the sorted list of canonical range starts, and the table of row
//! payloads keyed by those starts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::source::{RawRecord, text_field};

/// Field holding the raw range start in source rows.
pub const BEGIN_FIELD: &str = "begin";
/// Field added to every stored record with its canonical range start.
pub const NORMALIZED_FIELD: &str = "normalized_start";

const FLOOR_FIELD: &str = "floor";
const AISLE_FIELD: &str = "aisle";

/// Location codes are lowercase ASCII letters, digits, `-` and `_`.
///
/// They name artifact files, so nothing else is accepted.
pub fn is_valid_location_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

/// Payload for one shelf range, every source column kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeRecord {
    fields: RawRecord,
}

impl RangeRecord {
    pub fn new(fields: RawRecord) -> Self {
        Self { fields }
    }

    /// Source row augmented with its canonical range start.
    pub fn from_source(mut row: RawRecord, normalized_start: &str) -> Self {
        row.insert(
            NORMALIZED_FIELD.to_string(),
            serde_json::Value::String(normalized_start.to_string()),
        );
        Self { fields: row }
    }

    pub fn floor(&self) -> Option<String> {
        text_field(&self.fields, FLOOR_FIELD)
    }

    pub fn aisle(&self) -> Option<String> {
        text_field(&self.fields, AISLE_FIELD)
    }

    pub fn normalized_start(&self) -> Option<&str> {
        self.fields.get(NORMALIZED_FIELD)?.as_str()
    }
}

/// Ascending canonical range starts. Duplicates are kept.
///
/// Sorted on construction, including when deserialized, so lookups never
/// depend on how the sequence was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RangeIndex {
    starts: Vec<String>,
}

impl From<Vec<String>> for RangeIndex {
    fn from(mut starts: Vec<String>) -> Self {
        starts.sort_unstable();
        Self { starts }
    }
}

impl From<RangeIndex> for Vec<String> {
    fn from(index: RangeIndex) -> Self {
        index.starts
    }
}

impl RangeIndex {
    pub fn as_slice(&self) -> &[String] {
        &self.starts
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.starts.iter().map(String::as_str)
    }
}

/// Canonical range start -> range payload.
pub type RangeMetadataTable = BTreeMap<String, RangeRecord>;

/// A location's index and metadata table, loaded or built as a pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationIndex {
    pub index: RangeIndex,
    pub table: RangeMetadataTable,
}

impl LocationIndex {
    pub fn new(index: RangeIndex, table: RangeMetadataTable) -> Self {
        Self { index, table }
    }

    /// Index entries with no metadata row.
    pub fn uncovered(&self) -> Vec<&str> {
        self.index
            .iter()
            .filter(|start| !self.table.contains_key(*start))
            .collect()
    }
}
