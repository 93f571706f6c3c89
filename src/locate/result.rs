//! Lookup answers and the reasons a call number was not located.

use serde::Serialize;
use std::fmt;

use crate::index::RangeRecord;

/// Why a lookup produced no shelf position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotLocatedReason {
    /// The call number could not be normalized.
    Unnormalizable,
    /// No artifacts are available for the location.
    NoIndex,
    /// The call number sorts before the first range of the location.
    BeforeFirstRange,
    /// The index names a range start the metadata table lacks.
    MetadataInconsistency,
    /// The matching range has no aisle.
    IncompleteRecord,
}

impl fmt::Display for NotLocatedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unnormalizable => "call number could not be normalized",
            Self::NoIndex => "no index for location",
            Self::BeforeFirstRange => "call number precedes the first range",
            Self::MetadataInconsistency => "index and metadata disagree",
            Self::IncompleteRecord => "range has no aisle",
        })
    }
}

/// Answer to a lookup.
///
/// Serialized as `{floor, aisle, display_aisle, side, location, located,
/// reason}`. Descriptive fields are `null` unless `located` is true, in
/// which case `reason` is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocateResult {
    pub floor: Option<String>,
    pub aisle: Option<String>,
    pub display_aisle: Option<String>,
    pub side: Option<String>,
    pub location: String,
    pub located: bool,
    pub reason: Option<NotLocatedReason>,
}

impl LocateResult {
    pub fn not_located(location: impl Into<String>, reason: NotLocatedReason) -> Self {
        let location = location.into();
        crate::debug!("locate"; "not located in {}: {}", location, reason);
        Self {
            floor: None,
            aisle: None,
            display_aisle: None,
            side: None,
            location,
            located: false,
            reason: Some(reason),
        }
    }

    /// Located answer for `record`, or `IncompleteRecord` without an aisle.
    ///
    /// The aisle's last character is the side of the shelf; the rest is the
    /// aisle shown to patrons.
    pub fn from_record(location: impl Into<String>, record: &RangeRecord) -> Self {
        let location = location.into();
        let Some(aisle) = record.aisle().map(|a| a.to_uppercase()) else {
            return Self::not_located(location, NotLocatedReason::IncompleteRecord);
        };

        let mut display = aisle.clone();
        let side = display.pop().map(String::from);

        Self {
            floor: record.floor().map(|f| f.to_uppercase()),
            aisle: Some(aisle),
            display_aisle: Some(display),
            side,
            location,
            located: true,
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RangeRecord {
        RangeRecord::new(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_from_record_splits_side() {
        let row = record(json!({"aisle": "12a", "floor": 3}));
        let result = LocateResult::from_record("rock", &row);
        assert!(result.located);
        assert_eq!(result.aisle.as_deref(), Some("12A"));
        assert_eq!(result.display_aisle.as_deref(), Some("12"));
        assert_eq!(result.side.as_deref(), Some("A"));
        assert_eq!(result.floor.as_deref(), Some("3"));
        assert_eq!(result.reason, None);
    }

    #[test]
    fn test_from_record_without_floor_still_located() {
        let result = LocateResult::from_record("sci", &record(json!({"aisle": "B"})));
        assert!(result.located);
        assert_eq!(result.floor, None);
        assert_eq!(result.display_aisle.as_deref(), Some(""));
        assert_eq!(result.side.as_deref(), Some("B"));
    }

    #[test]
    fn test_from_record_blank_aisle() {
        let row = record(json!({"aisle": "  ", "floor": "1"}));
        let result = LocateResult::from_record("sci", &row);
        assert_eq!(
            result,
            LocateResult::not_located("sci", NotLocatedReason::IncompleteRecord)
        );
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(
            NotLocatedReason::BeforeFirstRange.to_string(),
            "call number precedes the first range"
        );
        assert_eq!(NotLocatedReason::NoIndex.to_string(), "no index for location");
    }

    #[test]
    fn test_serialized_shape() {
        let result = LocateResult::not_located("rock", NotLocatedReason::BeforeFirstRange);
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "floor": null,
                "aisle": null,
                "display_aisle": null,
                "side": null,
                "location": "rock",
                "located": false,
                "reason": "before_first_range",
            })
        );
    }
}
