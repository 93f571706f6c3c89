//! `[data]` section configuration.
//!
//! ```toml
//! [data]
//! dir = "data/index"          # index and metadata files
//! meta = "data/.meta.json"    # build record, default <dir>/.meta.json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::resolve_config_path;

/// Where index artifacts and the build record live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub meta: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/index"),
            meta: None,
        }
    }
}

impl DataConfig {
    pub const DIR: FieldPath = FieldPath::new("data.dir");

    pub fn meta_path(&self) -> PathBuf {
        self.meta
            .clone()
            .unwrap_or_else(|| self.dir.join(".meta.json"))
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.dir.as_os_str().is_empty() {
            diag.error(Self::DIR, "data directory must not be empty");
        }
    }

    pub(crate) fn normalize(&mut self, root: &Path) {
        if !self.dir.as_os_str().is_empty() {
            self.dir = resolve_config_path(&self.dir, root);
        }
        if let Some(meta) = self.meta.take() {
            self.meta = Some(resolve_config_path(&meta, root));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_meta_defaults_into_dir() {
        let config = test_parse_config("[data]\ndir = \"/srv/index\"");
        assert_eq!(config.data.meta_path(), PathBuf::from("/srv/index/.meta.json"));
    }

    #[test]
    fn test_normalize_relative_paths() {
        let mut data =
            test_parse_config("[data]\ndir = \"index\"\nmeta = \"state/meta.json\"").data;
        data.normalize(Path::new("/srv/locator"));
        assert_eq!(data.dir, PathBuf::from("/srv/locator/index"));
        assert_eq!(data.meta_path(), PathBuf::from("/srv/locator/state/meta.json"));
    }
}
