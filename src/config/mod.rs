//! Configuration management for `locator.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── data       # [data]
//! │   ├── location   # [[locations]]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # LocatorConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section           | Purpose                                   |
//! |-------------------|-------------------------------------------|
//! | `[data]`          | Artifact directory and build record path  |
//! | `[[locations]]`   | Location codes, sources, call number rules |
//! | `[serve]`         | Lookup server (interface, port, reload)   |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{DataConfig, LocationConfig, ServeConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::callnumber::SchemeNormalizer;
use crate::cli::{Cli, Commands};
use crate::index::{JsonArtifactStore, JsonMetaStore};
use crate::log;
use crate::utils::path::normalize_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing locator.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory holding the config file; relative paths start here
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub locations: Vec<LocationConfig>,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl LocatorConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Relative paths inside
    /// it are resolved against the directory containing it.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let config_path = find_config_file(&cli.config, &cwd)
            .ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.finalize(cli, &root);
        config.validate()?;

        crate::debug!("config"; "loaded {}", config.config_path.display());
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve paths and apply CLI overrides.
    fn finalize(&mut self, cli: &Cli, root: &Path) {
        self.root = root.to_path_buf();
        self.normalize_paths(root);
        self.apply_command_options(cli);
    }

    fn normalize_paths(&mut self, root: &Path) {
        self.data.normalize(root);
        for location in &mut self.locations {
            location.normalize(root);
        }
    }

    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve {
            interface, port, ..
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collect every configuration problem and fail if there is any.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.data.validate(&mut diag);
        section::validate_locations(&self.locations, &mut diag);
        self.serve.validate(&mut diag);

        if self.locations.is_empty() {
            log!("warning"; "no [[locations]] configured");
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    // ========================================================================
    // accessors
    // ========================================================================

    pub fn location(&self, code: &str) -> Option<&LocationConfig> {
        let code = code.trim().to_lowercase();
        self.locations.iter().find(|l| l.code == code)
    }

    /// The named locations, or all of them when `codes` is empty.
    pub fn select(&self, codes: &[String]) -> Result<Vec<LocationConfig>, ConfigError> {
        if codes.is_empty() {
            return Ok(self.locations.clone());
        }
        codes
            .iter()
            .map(|code| {
                self.location(code)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownLocation(code.clone()))
            })
            .collect()
    }

    pub fn location_codes(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(|l| l.code.as_str())
    }

    /// Normalizer applying each location's configured scheme.
    pub fn normalizer(&self) -> SchemeNormalizer {
        SchemeNormalizer::new(self.locations.iter().map(|l| (l.code.as_str(), l.scheme)))
    }

    pub fn artifact_store(&self) -> JsonArtifactStore {
        JsonArtifactStore::new(&self.data.dir)
    }

    pub fn meta_store(&self) -> JsonMetaStore {
        JsonMetaStore::new(self.data.meta_path())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config, panicking on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> LocatorConfig {
    let (parsed, ignored) = LocatorConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
