//! Overview aggregation.

use std::cmp::Ordering;

use smokefree_core::{HealthOverview, Milestone, Time};

/// Rolls a milestone set into a [`HealthOverview`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OverviewAggregator;

impl OverviewAggregator {
    /// Summarize the set. Pure; the input is not modified.
    pub fn aggregate(&self, milestones: &[Milestone]) -> HealthOverview {
        let total_metrics = milestones.len();
        let completed_metrics = milestones.iter().filter(|m| m.is_completed).count();
        let in_progress_metrics = milestones.iter().filter(|m| m.is_in_progress()).count();

        let overall_progress = if total_metrics > 0 {
            milestones.iter().map(|m| m.current_progress).sum::<f64>() / total_metrics as f64
        } else {
            0.0
        };

        let mut recent_achievements: Vec<Milestone> =
            milestones.iter().filter(|m| m.is_completed).cloned().collect();
        recent_achievements.sort_by(|a, b| {
            later_first(a.achieved_date, b.achieved_date).then(a.kind.cmp(&b.kind))
        });

        let mut upcoming_milestones: Vec<Milestone> =
            milestones.iter().filter(|m| !m.is_completed).cloned().collect();
        upcoming_milestones.sort_by(|a, b| {
            earlier_first(a.target_date, b.target_date).then(a.kind.cmp(&b.kind))
        });

        HealthOverview {
            total_metrics,
            completed_metrics,
            in_progress_metrics,
            overall_progress,
            next_milestone: upcoming_milestones.first().cloned(),
            recent_achievements,
            upcoming_milestones,
        }
    }
}

// Unknown dates sort last in both orders.
fn earlier_first(a: Option<Time>, b: Option<Time>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn later_first(a: Option<Time>, b: Option<Time>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
