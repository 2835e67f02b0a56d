//! Sync error types.

use smokefree_core::{InvariantViolation, MilestoneKind};
use smokefree_source::SourceError;

/// Error type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by a refresh cycle.
///
/// None of these are fatal; the session keeps its last known-good data and
/// the next refresh retries.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The source failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A fetched milestone broke an invariant
    #[error("Invalid milestone: {0}")]
    Invalid(#[from] InvariantViolation),

    /// The fetched set does not cover the catalog exactly once
    #[error("Incomplete milestone set: {found} entries, missing {missing:?}")]
    Incomplete {
        /// Entries received
        found: usize,
        /// Kinds absent from the set
        missing: Vec<MilestoneKind>,
    },

    /// The same kind appeared more than once
    #[error("Duplicate milestone kind: {0}")]
    Duplicate(MilestoneKind),
}

impl SyncError {
    /// Whether the underlying failure is a connectivity problem.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SyncError::Source(e) if e.is_connectivity())
    }
}
