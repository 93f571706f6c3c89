//! Predecessor search over a location's range index.

use super::result::{LocateResult, NotLocatedReason};
use crate::index::{LocationIndex, RangeIndex};

/// Start of the range containing `query`: the greatest entry `<= query`.
///
/// `None` when `query` sorts before every entry. The insertion point is
/// taken with equal entries to its left, so a query equal to a range start
/// belongs to that range.
pub fn predecessor<'a>(index: &'a RangeIndex, query: &str) -> Option<&'a str> {
    let starts = index.as_slice();
    let p = starts.partition_point(|start| start.as_str() <= query);
    if p == 0 {
        return None;
    }
    Some(starts[p - 1].as_str())
}

/// Resolve an already canonical call number against a loaded location.
pub(crate) fn locate_in(data: &LocationIndex, canonical: &str, location: &str) -> LocateResult {
    let Some(start) = predecessor(&data.index, canonical) else {
        crate::debug!("locate"; "{} precedes every range of {}", canonical, location);
        return LocateResult::not_located(location, NotLocatedReason::BeforeFirstRange);
    };

    match data.table.get(start) {
        Some(record) => LocateResult::from_record(location, record),
        None => {
            crate::log!(
                "warning";
                "{}: index entry {:?} has no metadata, rebuild the location",
                location,
                start
            );
            LocateResult::not_located(location, NotLocatedReason::MetadataInconsistency)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RangeMetadataTable, RangeRecord};
    use serde_json::json;

    fn abc() -> RangeIndex {
        RangeIndex::from(vec!["A".to_string(), "B".to_string(), "C".to_string()])
    }

    #[test]
    fn test_predecessor_before_first() {
        assert_eq!(predecessor(&abc(), "0"), None);
        assert_eq!(predecessor(&abc(), ""), None);
    }

    #[test]
    fn test_predecessor_within_ranges() {
        let index = abc();
        assert_eq!(predecessor(&index, "A"), Some("A"));
        assert_eq!(predecessor(&index, "AZZ"), Some("A"));
        assert_eq!(predecessor(&index, "B"), Some("B"));
        assert_eq!(predecessor(&index, "BA"), Some("B"));
    }

    #[test]
    fn test_predecessor_after_last() {
        assert_eq!(predecessor(&abc(), "C"), Some("C"));
        assert_eq!(predecessor(&abc(), "ZZZ"), Some("C"));
    }

    #[test]
    fn test_predecessor_empty_index() {
        assert_eq!(predecessor(&RangeIndex::default(), "A"), None);
    }

    #[test]
    fn test_predecessor_duplicates() {
        let index = RangeIndex::from(vec!["B".to_string(), "A".to_string(), "B".to_string()]);
        assert_eq!(predecessor(&index, "B"), Some("B"));
        assert_eq!(predecessor(&index, "AB"), Some("A"));
    }

    #[test]
    fn test_locate_in_metadata_inconsistency() {
        let mut table = RangeMetadataTable::new();
        table.insert(
            "A".to_string(),
            RangeRecord::new(json!({"aisle": "1A"}).as_object().cloned().unwrap()),
        );
        let data = LocationIndex::new(abc(), table);

        assert!(locate_in(&data, "A5", "rock").located);
        assert_eq!(
            locate_in(&data, "B5", "rock").reason,
            Some(NotLocatedReason::MetadataInconsistency)
        );
    }
}
