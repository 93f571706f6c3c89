//! Shelf marks compared as plain text.

use super::{Normalize, NormalizeError, collapse_upper};

/// Uppercases and collapses whitespace; nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralNormalizer;

impl Normalize for LiteralNormalizer {
    fn normalize(&self, raw: &str, _location: &str) -> Result<String, NormalizeError> {
        let normalized = collapse_upper(raw);
        if normalized.is_empty() {
            return Err(NormalizeError::Empty);
        }
        Ok(normalized)
    }
}
