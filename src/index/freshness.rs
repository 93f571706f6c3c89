//! Change detection: decide whether a location must be rebuilt.
//!
//! A location is rebuilt when forced, when it has never been built, or when
//! any one of its sheets changed after the last recorded build. Sheets that
//! cannot report a modification time always count as changed.

use std::time::SystemTime;

use crate::source::SheetInfo;
use crate::utils::date::{display_millis, system_time_millis};

/// Outcome of the freshness check for one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// `--force` was given.
    Forced,
    /// No build has been recorded yet.
    NeverBuilt,
    /// A build is recorded but this location has no artifacts.
    MissingArtifacts,
    /// The named sheet changed after the last build.
    Changed { sheet: String },
    /// The named sheet has no known modification time.
    UnknownModified { sheet: String },
    /// Every sheet is older than the last build.
    Unchanged,
}

impl Freshness {
    pub fn needs_rebuild(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Short reason for log output.
    pub fn describe(&self) -> String {
        match self {
            Self::Forced => "forced".to_string(),
            Self::NeverBuilt => "no previous build".to_string(),
            Self::MissingArtifacts => "no artifacts on disk".to_string(),
            Self::Changed { sheet } => format!("sheet `{sheet}` changed"),
            Self::UnknownModified { sheet } => format!("sheet `{sheet}` has no modification time"),
            Self::Unchanged => "unchanged".to_string(),
        }
    }
}

/// Check a location's sheets against the last recorded build.
pub fn check(
    sheets: &[SheetInfo],
    last_build: Option<SystemTime>,
    has_artifacts: bool,
    force: bool,
) -> Freshness {
    if force {
        return Freshness::Forced;
    }
    let Some(last_build) = last_build else {
        return Freshness::NeverBuilt;
    };
    if !has_artifacts {
        return Freshness::MissingArtifacts;
    }

    for sheet in sheets {
        match sheet.modified {
            None => {
                return Freshness::UnknownModified {
                    sheet: sheet.title.clone(),
                };
            }
            Some(modified) if modified > last_build => {
                crate::debug!(
                    "index";
                    "sheet {} updated {} after last build {}",
                    sheet.title,
                    display_millis(system_time_millis(modified)),
                    display_millis(system_time_millis(last_build))
                );
                return Freshness::Changed {
                    sheet: sheet.title.clone(),
                };
            }
            Some(_) => {}
        }
    }

    Freshness::Unchanged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn sheet(title: &str, modified: Option<u64>) -> SheetInfo {
        SheetInfo {
            title: title.to_string(),
            key: title.to_string(),
            modified: modified.map(at),
        }
    }

    #[test]
    fn test_unchanged_when_build_not_older() {
        let sheets = [sheet("a", Some(100)), sheet("b", Some(200))];
        assert_eq!(check(&sheets, Some(at(200)), true, false), Freshness::Unchanged);
        assert_eq!(check(&sheets, Some(at(500)), true, false), Freshness::Unchanged);
    }

    #[test]
    fn test_any_newer_sheet_triggers_rebuild() {
        let sheets = [sheet("a", Some(100)), sheet("b", Some(300))];
        assert_eq!(
            check(&sheets, Some(at(200)), true, false),
            Freshness::Changed {
                sheet: "b".to_string()
            }
        );
    }

    #[test]
    fn test_edit_later_in_the_build_second_rebuilds() {
        use crate::utils::date::parse_system_time;

        let started =
            parse_system_time("2024-06-15T14:30:45Z").unwrap() + Duration::from_millis(500);
        let edited = SheetInfo {
            title: "main".to_string(),
            key: "main".to_string(),
            modified: parse_system_time("2024-06-15T14:30:45.900Z"),
        };
        assert_eq!(
            check(&[edited], Some(started), true, false),
            Freshness::Changed {
                sheet: "main".to_string()
            }
        );
    }

    #[test]
    fn test_force_overrides() {
        let sheets = [sheet("a", Some(100))];
        let result = check(&sheets, Some(at(500)), true, true);
        assert_eq!(result, Freshness::Forced);
        assert!(result.needs_rebuild());
    }

    #[test]
    fn test_never_built_and_missing_artifacts() {
        let sheets = [sheet("a", Some(100))];
        assert_eq!(check(&sheets, None, false, false), Freshness::NeverBuilt);
        assert_eq!(
            check(&sheets, Some(at(500)), false, false),
            Freshness::MissingArtifacts
        );
    }

    #[test]
    fn test_unknown_modification_rebuilds() {
        let sheets = [sheet("a", Some(100)), sheet("b", None)];
        let result = check(&sheets, Some(at(500)), true, false);
        assert!(result.needs_rebuild());
        assert_eq!(result.describe(), "sheet `b` has no modification time");
    }
}
