//! Elapsed-fraction progress computation.

use smokefree_core::{Milestone, Time, MS_PER_HOUR};

/// Result of a single progress computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressComputation {
    /// Percentage complete, clamped to 0-100
    pub progress: f64,
    /// Hours left until the target, never negative
    pub remaining_hours: f64,
    /// Progress has reached 100
    pub completed: bool,
}

/// Computes milestone progress from an anchor, a duration and "now".
///
/// This is a pure function of its inputs. The authoritative source and the
/// offline estimator both call it, so identical inputs give identical results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressComputer;

impl ProgressComputer {
    /// Compute progress toward a target `target_duration_hours` after `anchor`.
    pub fn compute(&self, anchor: Time, target_duration_hours: f64, now: Time) -> ProgressComputation {
        let total_ms = target_duration_hours * MS_PER_HOUR;
        if total_ms <= 0.0 {
            return ProgressComputation {
                progress: 100.0,
                remaining_hours: 0.0,
                completed: true,
            };
        }

        let elapsed_ms = (now - anchor).num_milliseconds().max(0) as f64;
        let progress = (elapsed_ms / total_ms * 100.0).clamp(0.0, 100.0);
        let remaining_hours = ((total_ms - elapsed_ms) / MS_PER_HOUR).max(0.0);

        ProgressComputation {
            progress,
            remaining_hours,
            completed: progress >= 100.0,
        }
    }

    /// Compute progress for a milestone from its effective anchor.
    ///
    /// Returns `None` when the milestone has no target date.
    pub fn compute_milestone(&self, milestone: &Milestone, now: Time) -> Option<ProgressComputation> {
        let anchor = milestone.effective_anchor()?;
        Some(self.compute(anchor, milestone.target_duration_hours(), now))
    }
}
