//! Relapse events.

use crate::id::EventId;
use crate::Time;
use serde::{Deserialize, Serialize};

/// An instantaneous fact: a relapse occurred at `occurred_at`.
///
/// The engine consumes each event once and does not keep it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionEvent {
    /// Unique identifier
    pub id: EventId,

    /// When the relapse happened
    pub occurred_at: Time,

    /// Free-form note from the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RegressionEvent {
    /// Create a relapse event at the given instant.
    pub fn at(occurred_at: Time) -> Self {
        Self {
            id: EventId::new(),
            occurred_at,
            note: None,
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
