//! `[[locations]]` entries.
//!
//! ```toml
//! [[locations]]
//! code = "rock-chinese"
//! source = "sheets/rock-east-asian"
//! worksheet = "chinese"
//! scheme = "lc"
//! ```

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::callnumber::Scheme;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::index::is_valid_location_code;
use crate::utils::path::resolve_config_path;

/// One collection area and the source its ranges are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Location code used in lookups and artifact names.
    pub code: String,

    /// Sheet file, or directory of sheet files.
    pub source: PathBuf,

    /// Only read the sheet with this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worksheet: Option<String>,

    #[serde(default)]
    pub scheme: Scheme,
}

impl LocationConfig {
    pub const CODE: FieldPath = FieldPath::new("locations.code");
    pub const SOURCE: FieldPath = FieldPath::new("locations.source");

    /// Resolve `source` against `root`. An empty path is left for validation.
    pub(crate) fn normalize(&mut self, root: &Path) {
        if self.source.as_os_str().is_empty() {
            return;
        }
        self.source = resolve_config_path(&self.source, root);
    }
}

/// Check every entry, reporting each problem once.
pub(crate) fn validate_locations(locations: &[LocationConfig], diag: &mut ConfigDiagnostics) {
    let mut seen = FxHashSet::default();

    for (i, location) in locations.iter().enumerate() {
        let code = location.code.as_str();
        if code.trim().is_empty() {
            diag.error(LocationConfig::CODE, format!("location #{} has an empty code", i + 1));
            continue;
        }
        if !is_valid_location_code(code) {
            diag.error_with_hint(
                LocationConfig::CODE,
                format!("invalid location code `{code}`"),
                "use lowercase letters, digits, `-` and `_`",
            );
        }
        if !seen.insert(code) {
            diag.error(LocationConfig::CODE, format!("duplicate location `{code}`"));
        }
        if location.source.as_os_str().is_empty() {
            diag.error(LocationConfig::SOURCE, format!("location `{code}` has no source"));
        }
    }
}
