//! `locator index`: rebuild range indexes from the configured sources.

use anyhow::Result;

use crate::config::LocatorConfig;
use crate::index::{BuildReport, Indexer, LocationOutcome};
use crate::log;
use crate::source::JsonSheetSource;
use crate::utils::date::{display_millis, system_time_millis};

/// Index the named locations, or all of them.
///
/// Fails if any location failed, after every location was attempted.
pub fn run_index(config: &LocatorConfig, force: bool, codes: &[String]) -> Result<()> {
    let locations = config.select(codes)?;
    if locations.is_empty() {
        log!("index"; "nothing to index");
        return Ok(());
    }

    let normalizer = config.normalizer();
    let store = config.artifact_store();
    let meta = config.meta_store();
    let indexer = Indexer::new(&JsonSheetSource, &normalizer, &store, &meta);

    let report = if codes.is_empty() {
        indexer.build_all(&locations, force)
    } else {
        log!("index"; "partial run, build time will not be recorded");
        indexer.build_some(&locations, force)
    };

    for line in summary(&report) {
        log!("index"; "{}", line);
    }

    let report = report.into_result()?;
    if let Some(time) = report.recorded {
        log!("index"; "build recorded at {}", display_millis(system_time_millis(time)));
    }
    Ok(())
}

/// One line per attempted location, then a total.
fn summary(report: &BuildReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|(code, outcome)| match outcome {
            LocationOutcome::Built { reason, stats } => format!(
                "{code}: rebuilt ({}), {} ranges, {} rows skipped, {} duplicates",
                reason.describe(),
                stats.indexed,
                stats.skipped(),
                stats.duplicates
            ),
            LocationOutcome::Skipped => format!("{code}: unchanged"),
        })
        .collect();

    lines.extend(
        report
            .failures
            .iter()
            .map(|failure| format!("{}: failed", failure.location)),
    );
    lines.push(format!(
        "{} rebuilt, {} unchanged, {} failed",
        report.built(),
        report.skipped(),
        report.failures.len()
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup(dir: &Path) -> LocatorConfig {
        let sheets = dir.join("sheets");
        fs::create_dir_all(&sheets).unwrap();
        fs::write(
            sheets.join("rock.json"),
            r#"[
                {"begin": "PS3568.U8", "aisle": "12A", "floor": "3"},
                {"begin": "QA76.73", "aisle": "14B", "floor": "3"},
                {"begin": "", "aisle": "99Z"}
            ]"#,
        )
        .unwrap();

        let mut config = test_parse_config(
            "[data]\ndir = \"index\"\n\
             [[locations]]\ncode = \"rock\"\nsource = \"sheets/rock.json\"\n\
             [[locations]]\ncode = \"sci\"\nsource = \"sheets/sci\"",
        );
        config.data.normalize(dir);
        for location in &mut config.locations {
            location.normalize(dir);
        }
        config
    }

    #[test]
    fn test_run_index_reports_failure_after_building_others() {
        let dir = TempDir::new().unwrap();
        let config = setup(dir.path());

        let err = run_index(&config, false, &[]).unwrap_err();
        assert!(err.to_string().contains("sci"));

        let store = config.artifact_store();
        assert!(store.index_path("rock").exists());
        assert!(!config.data.meta_path().exists(), "failed run must not record");
    }

    #[test]
    fn test_run_index_subset() {
        let dir = TempDir::new().unwrap();
        let config = setup(dir.path());

        run_index(&config, false, &["rock".to_string()]).unwrap();
        assert!(config.artifact_store().meta_path("rock").exists());
        assert!(!config.data.meta_path().exists());

        assert!(run_index(&config, false, &["annex".to_string()]).is_err());
    }

    #[test]
    fn test_summary_lines() {
        let dir = TempDir::new().unwrap();
        let config = setup(dir.path());
        let locations = config.select(&["rock".to_string()]).unwrap();
        let normalizer = config.normalizer();
        let store = config.artifact_store();
        let meta = config.meta_store();
        let report = Indexer::new(&JsonSheetSource, &normalizer, &store, &meta)
            .build_all(&locations, false);

        assert_eq!(
            summary(&report),
            [
                "rock: rebuilt (no previous build), 2 ranges, 1 rows skipped, 0 duplicates",
                "1 rebuilt, 0 unchanged, 0 failed",
            ]
        );
    }
}
