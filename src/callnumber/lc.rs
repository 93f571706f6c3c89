//! Library of Congress call numbers.
//!
//! Canonical layout, components joined by one space:
//!
//! ```text
//! PS3568.U812 R57x 1994  ->  "PS  3568 U812 R57 X 1994"
//! QA76.73.P98            ->  "QA  0076.73 P98"
//! ```
//!
//! - class letters, left aligned and padded to three characters
//! - class number, integer part zero padded to four digits, decimal kept
//! - up to three cutters (letter + digits, which already sort as decimals)
//! - whatever follows (dates, volumes, copy), whitespace collapsed
//!
//! A space sorts below `.` and every digit or letter, so a shorter component
//! always shelves before a longer one that extends it.

use regex::Regex;
use std::sync::OnceLock;

use super::{Normalize, NormalizeError, Scheme, collapse_upper};

#[derive(Debug, Default, Clone, Copy)]
pub struct LcNormalizer;

// ASCII classes only: `regex` is built without its Unicode tables.
const PATTERN: &str = r"^(?P<class>[A-Z]{1,3}) ?(?P<int>[0-9]+)(?:\.(?P<frac>[0-9]+))? ?(?:\.? ?(?P<c1>[A-Z][0-9]+))? ?(?:\.? ?(?P<c2>[A-Z][0-9]+))? ?(?:\.? ?(?P<c3>[A-Z][0-9]+))?(?P<rest>.*)$";

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PATTERN).unwrap())
}

impl Normalize for LcNormalizer {
    fn normalize(&self, raw: &str, _location: &str) -> Result<String, NormalizeError> {
        let input = collapse_upper(raw);
        if input.is_empty() {
            return Err(NormalizeError::Empty);
        }

        let caps = pattern()
            .captures(&input)
            .ok_or_else(|| NormalizeError::Unparseable {
                raw: raw.trim().to_string(),
                scheme: Scheme::Lc,
            })?;

        let mut parts = Vec::with_capacity(6);
        parts.push(format!("{:<3}", &caps["class"]));

        let mut number = format!("{:0>4}", &caps["int"]);
        if let Some(frac) = caps.name("frac") {
            number.push('.');
            number.push_str(frac.as_str());
        }
        parts.push(number);

        for name in ["c1", "c2", "c3"] {
            if let Some(cutter) = caps.name(name) {
                parts.push(cutter.as_str().to_string());
            }
        }

        let rest = caps["rest"].trim_start_matches(['.', ' ']).trim();
        if !rest.is_empty() {
            parts.push(rest.to_string());
        }

        Ok(parts.join(" "))
    }
}
