//! Overview snapshot - the aggregate view over a user's milestone set.

use serde::{Deserialize, Serialize};
use crate::milestone::Milestone;

/// Summary of all milestones at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOverview {
    /// Number of milestones tracked
    pub total_metrics: usize,

    /// Milestones currently achieved
    pub completed_metrics: usize,

    /// Milestones strictly between 0% and 100%
    pub in_progress_metrics: usize,

    /// Mean progress across all milestones (0-100)
    pub overall_progress: f64,

    /// The next milestone to be reached
    pub next_milestone: Option<Milestone>,

    /// Achieved milestones, most recent first
    pub recent_achievements: Vec<Milestone>,

    /// Milestones still to reach, soonest first
    pub upcoming_milestones: Vec<Milestone>,
}

impl Default for HealthOverview {
    fn default() -> Self {
        Self {
            total_metrics: 0,
            completed_metrics: 0,
            in_progress_metrics: 0,
            overall_progress: 0.0,
            next_milestone: None,
            recent_achievements: Vec::new(),
            upcoming_milestones: Vec::new(),
        }
    }
}
