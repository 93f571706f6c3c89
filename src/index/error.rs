//! Indexing errors.

use std::error::Error as _;
use thiserror::Error;

use super::store::StoreError;
use crate::source::SourceError;

/// Why a single location could not be rebuilt.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A location whose rebuild was aborted.
#[derive(Debug, Error)]
#[error("failed to index `{location}`")]
pub struct LocationFailure {
    pub location: String,
    #[source]
    pub error: IndexError,
}

impl LocationFailure {
    /// `location: cause: cause...` on one line.
    pub fn summary(&self) -> String {
        let mut out = format!("{}: {}", self.location, self.error);
        let mut source = self.error.source();
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

/// Failure of a whole indexing run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{} location(s) failed to index:\n{}", .0.len(), summarize(.0))]
    Locations(Vec<LocationFailure>),

    #[error("failed to record build time")]
    Bookkeeping(#[source] StoreError),
}

fn summarize(failures: &[LocationFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("- {}", f.summary()))
        .collect::<Vec<_>>()
        .join("\n")
}
