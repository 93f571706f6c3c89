//! Call number normalization.
//!
//! Turns a raw call number into a canonical string whose byte order matches
//! shelving order. The rest of the crate only depends on the [`Normalize`]
//! trait; which grammar applies is decided per location by its [`Scheme`].

mod lc;
mod literal;

pub use lc::LcNormalizer;
pub use literal::LiteralNormalizer;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Normalization failures. Always recoverable by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("empty call number")]
    Empty,

    #[error("cannot parse `{raw}` as a {scheme} call number")]
    Unparseable { raw: String, scheme: Scheme },
}

/// Maps a raw call number to its canonical, sortable form.
///
/// Implementations must be deterministic: the same input and location
/// always yield the same output.
pub trait Normalize: Send + Sync {
    fn normalize(&self, raw: &str, location: &str) -> Result<String, NormalizeError>;
}

/// Canonical form shared by the indexer and the resolver.
///
/// Input and output are uppercased so both sides agree on the key space
/// whatever the normalizer does with case.
pub fn canonicalize(
    normalizer: &dyn Normalize,
    raw: &str,
    location: &str,
) -> Result<String, NormalizeError> {
    let raw = raw.trim().to_uppercase();
    if raw.is_empty() {
        return Err(NormalizeError::Empty);
    }
    normalizer
        .normalize(&raw, location)
        .map(|canonical| canonical.to_uppercase())
}

/// Call number grammar used by a location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Library of Congress classification.
    #[default]
    Lc,
    /// Opaque shelf marks compared as uppercased text.
    Literal,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lc => f.write_str("lc"),
            Self::Literal => f.write_str("literal"),
        }
    }
}

/// Dispatches to the grammar configured for each location.
///
/// Locations without an entry use [`Scheme::Lc`].
#[derive(Debug, Default, Clone)]
pub struct SchemeNormalizer {
    schemes: FxHashMap<String, Scheme>,
}

impl SchemeNormalizer {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, Scheme)>) -> Self {
        let schemes = entries
            .into_iter()
            .map(|(code, scheme)| (code.trim().to_ascii_lowercase(), scheme))
            .collect();
        Self { schemes }
    }

    pub fn scheme_for(&self, location: &str) -> Scheme {
        self.schemes
            .get(&location.trim().to_ascii_lowercase())
            .copied()
            .unwrap_or_default()
    }
}

impl Normalize for SchemeNormalizer {
    fn normalize(&self, raw: &str, location: &str) -> Result<String, NormalizeError> {
        match self.scheme_for(location) {
            Scheme::Lc => LcNormalizer.normalize(raw, location),
            Scheme::Literal => LiteralNormalizer.normalize(raw, location),
        }
    }
}

/// Uppercase and collapse runs of whitespace to a single space.
fn collapse_upper(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_dispatch() {
        let normalizer = SchemeNormalizer::new([("rock", Scheme::Lc), ("Annex", Scheme::Literal)]);
        assert_eq!(normalizer.scheme_for(" ANNEX "), Scheme::Literal);
        assert_eq!(normalizer.scheme_for("sci"), Scheme::Lc);

        assert_eq!(normalizer.normalize("box  12", "annex").unwrap(), "BOX 12");
        assert_eq!(
            normalizer.normalize("QA76.73", "rock").unwrap(),
            LcNormalizer.normalize("QA76.73", "rock").unwrap()
        );
    }

    #[test]
    fn test_scheme_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            scheme: Scheme,
        }
        let w: Wrapper = toml::from_str(r#"scheme = "literal""#).unwrap();
        assert_eq!(w.scheme, Scheme::Literal);
    }

    #[test]
    fn test_canonicalize_uppercases() {
        struct Lower;
        impl Normalize for Lower {
            fn normalize(&self, raw: &str, _: &str) -> Result<String, NormalizeError> {
                Ok(raw.to_lowercase())
            }
        }
        assert_eq!(canonicalize(&Lower, " ps3568.u8 ", "rock").unwrap(), "PS3568.U8");
        assert_eq!(canonicalize(&Lower, "  ", "rock"), Err(NormalizeError::Empty));
    }

    #[test]
    fn test_collapse_upper() {
        assert_eq!(collapse_upper("  ps 3568\t u8 "), "PS 3568 U8");
        assert_eq!(collapse_upper("   "), "");
    }
}
