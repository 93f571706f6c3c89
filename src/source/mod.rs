//! Record sources feeding the indexer.
//!
//! A location's source is a set of sheets. Listing sheets is separate from
//! reading their rows so change detection can run before any rows are read.

mod json;

pub use json::JsonSheetSource;

use serde_json::Value;
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;

use crate::config::LocationConfig;

/// One source row: column name -> cell value, in column order.
pub type RawRecord = serde_json::Map<String, Value>;

/// A sheet of a source, as seen before its rows are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    /// Human-readable sheet name (used for `worksheet` selection).
    pub title: String,
    /// Opaque handle the source uses to read the rows back.
    pub key: String,
    /// Last modification reported by the source. `None` means unknown.
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open source `{0}`")]
    Open(PathBuf, #[source] std::io::Error),

    #[error("malformed sheet `{0}`")]
    Malformed(PathBuf, #[source] serde_json::Error),

    #[error("worksheet `{worksheet}` not found in `{origin}`")]
    WorksheetNotFound { origin: String, worksheet: String },

    #[error("source `{0}` contains no sheets")]
    NoSheets(String),
}

/// Provider of sheets and rows for a location.
pub trait RecordSource {
    /// List the sheets that make up `location`'s source.
    fn sheets(&self, location: &LocationConfig) -> Result<Vec<SheetInfo>, SourceError>;

    /// Read every row of a sheet returned by [`RecordSource::sheets`].
    fn records(&self, sheet: &SheetInfo) -> Result<Vec<RawRecord>, SourceError>;
}

/// Read a cell as text, treating absent, null and blank cells as missing.
///
/// Numbers and booleans are rendered as they appear in the sheet.
pub fn text_field(record: &RawRecord, key: &str) -> Option<String> {
    let text = match record.get(key)? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_text_field() {
        let rec = record(json!({
            "begin": "  PS3568.U8 ",
            "floor": 3,
            "blank": "   ",
            "null": null,
        }));
        assert_eq!(text_field(&rec, "begin").as_deref(), Some("PS3568.U8"));
        assert_eq!(text_field(&rec, "floor").as_deref(), Some("3"));
        assert_eq!(text_field(&rec, "blank"), None);
        assert_eq!(text_field(&rec, "null"), None);
        assert_eq!(text_field(&rec, "missing"), None);
    }
}
