//! `locator locate` and `locator normalize`.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;

use crate::callnumber::canonicalize;
use crate::cli::args::QueryArgs;
use crate::config::LocatorConfig;
use crate::locate::{LocateResult, LocationCache, Resolver, location_key};

/// Look up one call number and print the result as pretty JSON.
///
/// With `cache`, every configured location is loaded first, the way the
/// server answers; otherwise only the queried location is read.
pub fn run_locate(config: &LocatorConfig, args: &QueryArgs, cache: bool) -> Result<()> {
    let result = locate(config, args, cache);
    let json = serde_json::to_string_pretty(&result)?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "{json}").context("failed to write result")?;
    Ok(())
}

fn locate(config: &LocatorConfig, args: &QueryArgs, cache: bool) -> LocateResult {
    let normalizer = config.normalizer();
    let store = config.artifact_store();

    if cache {
        LocationCache::load(config.location_codes(), &store, Arc::new(normalizer))
            .resolve(&args.call_number, &args.location)
    } else {
        Resolver::new(&normalizer, &store).resolve(&args.call_number, &args.location)
    }
}

/// Print the canonical form of a call number for a location.
pub fn run_normalize(config: &LocatorConfig, args: &QueryArgs) -> Result<()> {
    let location = location_key(&args.location);
    let canonical = canonicalize(&config.normalizer(), &args.call_number, &location)
        .with_context(|| {
            format!("can't normalize `{}` for {}", args.call_number.trim(), location)
        })?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "{canonical}").context("failed to write result")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::index::{ArtifactStore, build_location};
    use crate::locate::NotLocatedReason;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn query(call_number: &str, location: &str) -> QueryArgs {
        QueryArgs {
            call_number: call_number.to_string(),
            location: location.to_string(),
        }
    }

    fn config_with_rock(dir: &Path) -> LocatorConfig {
        let mut config = test_parse_config(
            "[data]\ndir = \"index\"\n\
             [[locations]]\ncode = \"rock\"\nsource = \"sheets/rock\"\n\
             [[locations]]\ncode = \"annex\"\nsource = \"sheets/annex\"\nscheme = \"literal\"",
        );
        config.data.normalize(dir);

        let rows = json!([
            {"begin": "PS3568.U8", "aisle": "12A", "floor": "3"},
            {"begin": "QA76.73", "aisle": "14B", "floor": "3"},
        ]);
        let rows = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap());
        let (data, _) = build_location("rock", rows, &config.normalizer());
        config.artifact_store().save("rock", &data).unwrap();
        config
    }

    #[test]
    fn test_locate_with_and_without_cache() {
        let dir = TempDir::new().unwrap();
        let config = config_with_rock(dir.path());

        for cache in [false, true] {
            let found = locate(&config, &query("PS3575.Z9", "rock"), cache);
            assert!(found.located);
            assert_eq!(found.display_aisle.as_deref(), Some("12"));
            assert_eq!(found.side.as_deref(), Some("A"));

            let missed = locate(&config, &query("QA1", "annex"), cache);
            assert_eq!(missed.reason, Some(NotLocatedReason::NoIndex));
        }
    }

    #[test]
    fn test_run_normalize_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let config = config_with_rock(dir.path());

        assert!(run_normalize(&config, &query("PS3568.U8", "rock")).is_ok());
        let err = run_normalize(&config, &query("12345", "rock")).unwrap_err();
        assert!(err.to_string().contains("can't normalize `12345` for rock"));
    }
}
