//! Milestone source trait abstraction.

use async_trait::async_trait;
use smokefree_core::{HealthOverview, Milestone};

/// Error type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors that can occur while talking to a milestone source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source could not be reached at all
    #[error("Source unreachable: {0}")]
    Unreachable(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// Status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data arrived but breaks the milestone contract
    #[error("Malformed data: {0}")]
    Malformed(String),

    /// The source failed to recompute milestones
    #[error("Recompute failed: {0}")]
    Recompute(String),

    /// The user has no quit anchor yet
    #[error("No quit anchor recorded")]
    NoQuitAnchor,
}

impl SourceError {
    /// Whether this is a connectivity failure rather than a logical one.
    ///
    /// Connectivity failures trigger the offline estimator; everything else
    /// keeps the last known-good data.
    pub fn is_connectivity(&self) -> bool {
        match self {
            SourceError::Unreachable(_) => true,
            SourceError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            SourceError::Status { status, .. } => (502..=504).contains(status),
            _ => false,
        }
    }
}

/// The authoritative source of milestone state.
///
/// Implementations may be remote (HTTP) or in-process.
#[async_trait]
pub trait MilestoneSource: Send + Sync {
    /// Fetch the current aggregate view.
    async fn fetch_overview(&self) -> Result<HealthOverview>;

    /// Fetch the full milestone catalog with current fields.
    async fn fetch_milestones(&self) -> Result<Vec<Milestone>>;

    /// Ask the source to re-evaluate every milestone. Idempotent.
    async fn trigger_recompute(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_classification() {
        assert!(SourceError::Unreachable("dns".into()).is_connectivity());
        assert!(SourceError::Status { status: 503, body: String::new() }.is_connectivity());
        assert!(!SourceError::Status { status: 500, body: String::new() }.is_connectivity());
        assert!(!SourceError::Malformed("bad".into()).is_connectivity());
        assert!(!SourceError::Recompute("boom".into()).is_connectivity());
        assert!(!SourceError::NoQuitAnchor.is_connectivity());
    }
}
