//! Regression state machine.
//!
//! Drives milestones through `Fresh -> InProgress -> Achieved` as time passes
//! and applies the relapse penalty:
//! - a relapse restarts the milestone from the relapse instant, so the full
//!   target duration is incurred again
//! - a milestone that had been achieved becomes `Regressed` and stays at 0%
//!   until it is reached again under the new target
//! - a milestone that was never achieved simply restarts
//!
//! Relapses apply to the whole catalog at once; the streak is shared.

use chrono::Duration;
use smokefree_core::{Milestone, MilestoneKind, RegressionEvent, Time, MS_PER_HOUR};
use tracing::{debug, info};

use crate::computer::ProgressComputer;

/// What a progress update did to a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Progress or remaining time changed, state did not
    Unchanged,
    /// The milestone reached its target
    Achieved,
    /// Target date unknown; nothing to compute
    Unknown,
}

/// Effect of a relapse on one milestone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelapseOutcome {
    /// Affected milestone kind
    pub kind: MilestoneKind,
    /// The milestone had been achieved before and is now regressed
    pub regressed: bool,
    /// Target date before the relapse
    pub previous_target: Option<Time>,
    /// Target date after the relapse
    pub new_target: Time,
}

impl RelapseOutcome {
    /// How far the deadline moved.
    pub fn penalty(&self) -> Duration {
        match self.previous_target {
            Some(previous) => self.new_target - previous,
            None => Duration::zero(),
        }
    }
}

/// Applies progress updates and relapse penalties to milestones.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionEngine {
    computer: ProgressComputer,
}

impl RegressionEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance a milestone to `now`.
    pub fn advance(&self, milestone: &mut Milestone, now: Time) -> Transition {
        let Some(computation) = self.computer.compute_milestone(milestone, now) else {
            milestone.time_remaining_hours = None;
            return Transition::Unknown;
        };

        if milestone.is_completed {
            // Achievement only ends through a relapse.
            milestone.current_progress = 100.0;
            milestone.time_remaining_hours = Some(0.0);
            return Transition::Unchanged;
        }

        if computation.completed {
            milestone.current_progress = 100.0;
            milestone.achieved_date = milestone.target_date;
            milestone.is_completed = true;
            milestone.has_regressed = false;
            milestone.previously_achieved = true;
            milestone.time_remaining_hours = Some(0.0);
            info!("Milestone {} achieved", milestone.kind);
            return Transition::Achieved;
        }

        if !milestone.has_regressed {
            milestone.current_progress = computation.progress;
        }
        milestone.time_remaining_hours = Some(computation.remaining_hours);
        Transition::Unchanged
    }

    /// Advance every milestone to `now`.
    pub fn advance_all(&self, milestones: &mut [Milestone], now: Time) -> Vec<Transition> {
        milestones.iter_mut().map(|m| self.advance(m, now)).collect()
    }

    /// Apply a relapse to a single milestone.
    pub fn apply_relapse(&self, milestone: &mut Milestone, event: &RegressionEvent) -> RelapseOutcome {
        let was_achieved = milestone.is_completed
            || milestone.previously_achieved
            || milestone.achieved_date.is_some();

        let restarted = event.occurred_at + milestone.kind.target_duration();
        let previous_target = milestone.target_date;
        // Deadlines only ever move later, even for out-of-order events.
        let new_target = match previous_target {
            Some(previous) if previous > restarted => previous,
            _ => restarted,
        };

        milestone.current_progress = 0.0;
        milestone.achieved_date = None;
        milestone.is_completed = false;
        milestone.has_regressed = was_achieved;
        milestone.previously_achieved = was_achieved;
        milestone.target_date = Some(new_target);
        milestone.time_remaining_hours =
            Some(((new_target - event.occurred_at).num_milliseconds().max(0) as f64) / MS_PER_HOUR);

        debug!(
            "Relapse applied to {}: target {:?} -> {}, regressed={}",
            milestone.kind, previous_target, new_target, was_achieved
        );

        RelapseOutcome {
            kind: milestone.kind,
            regressed: was_achieved,
            previous_target,
            new_target,
        }
    }

    /// Apply a relapse to every milestone.
    pub fn apply_relapse_to_all(
        &self,
        milestones: &mut [Milestone],
        event: &RegressionEvent,
    ) -> Vec<RelapseOutcome> {
        let outcomes: Vec<_> = milestones
            .iter_mut()
            .map(|m| self.apply_relapse(m, event))
            .collect();

        let regressed = outcomes.iter().filter(|o| o.regressed).count();
        info!(
            "Relapse at {} restarted {} milestones ({} regressed)",
            event.occurred_at,
            outcomes.len(),
            regressed
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use smokefree_core::MilestoneState;

    fn t0() -> Time {
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    }

    fn day_milestone() -> Milestone {
        Milestone::fresh(MilestoneKind::HeartAttackRisk, t0())
    }

    #[test]
    fn test_end_to_end_scenario() {
        let engine = RegressionEngine::new();
        let mut m = day_milestone();

        assert_eq!(engine.advance(&mut m, t0() + Duration::hours(12)), Transition::Unchanged);
        assert_eq!(m.current_progress, 50.0);
        assert_eq!(m.time_remaining_hours, Some(12.0));
        assert!(!m.is_completed);
        assert_eq!(m.state(), MilestoneState::InProgress);

        assert_eq!(engine.advance(&mut m, t0() + Duration::hours(24)), Transition::Achieved);
        assert_eq!(m.current_progress, 100.0);
        assert!(m.is_completed);
        assert_eq!(m.achieved_date, Some(t0() + Duration::hours(24)));

        let outcome = engine.apply_relapse(&mut m, &RegressionEvent::at(t0() + Duration::hours(30)));
        assert!(outcome.regressed);
        assert_eq!(m.current_progress, 0.0);
        assert!(!m.is_completed);
        assert!(m.has_regressed);
        assert_eq!(m.achieved_date, None);
        assert_eq!(m.target_date, Some(t0() + Duration::hours(54)));
        assert_eq!(outcome.penalty(), Duration::hours(30));
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_relapse_before_first_achievement_is_not_regression() {
        let engine = RegressionEngine::new();
        let mut m = day_milestone();
        engine.advance(&mut m, t0() + Duration::hours(6));

        let outcome = engine.apply_relapse(&mut m, &RegressionEvent::at(t0() + Duration::hours(10)));
        assert!(!outcome.regressed);
        assert!(!m.has_regressed);
        assert_eq!(m.current_progress, 0.0);
        assert_eq!(m.target_date, Some(t0() + Duration::hours(34)));

        engine.advance(&mut m, t0() + Duration::hours(22));
        assert_eq!(m.current_progress, 50.0);
        assert_eq!(m.state(), MilestoneState::InProgress);
    }

    #[test]
    fn test_regressed_holds_zero_until_reachieved() {
        let engine = RegressionEngine::new();
        let mut m = day_milestone();
        engine.advance(&mut m, t0() + Duration::hours(24));
        engine.apply_relapse(&mut m, &RegressionEvent::at(t0() + Duration::hours(30)));

        engine.advance(&mut m, t0() + Duration::hours(42));
        assert_eq!(m.state(), MilestoneState::Regressed);
        assert_eq!(m.current_progress, 0.0);
        assert_eq!(m.time_remaining_hours, Some(12.0));
        assert!(m.validate().is_ok());

        assert_eq!(engine.advance(&mut m, t0() + Duration::hours(54)), Transition::Achieved);
        assert!(!m.has_regressed);
        assert!(m.is_completed);
        assert_eq!(m.achieved_date, Some(t0() + Duration::hours(54)));
    }

    #[test]
    fn test_second_relapse_while_regressed_stays_regressed() {
        let engine = RegressionEngine::new();
        let mut m = day_milestone();
        engine.advance(&mut m, t0() + Duration::hours(24));
        engine.apply_relapse(&mut m, &RegressionEvent::at(t0() + Duration::hours(30)));
        let outcome = engine.apply_relapse(&mut m, &RegressionEvent::at(t0() + Duration::hours(40)));

        assert!(outcome.regressed);
        assert!(m.has_regressed);
        assert_eq!(m.target_date, Some(t0() + Duration::hours(64)));
    }

    #[test]
    fn test_target_date_never_moves_earlier() {
        let engine = RegressionEngine::new();
        let mut m = day_milestone();
        engine.apply_relapse(&mut m, &RegressionEvent::at(t0() + Duration::hours(20)));
        let before = m.target_date;

        // Event delivered late, stamped before the previous relapse.
        let outcome = engine.apply_relapse(&mut m, &RegressionEvent::at(t0() + Duration::hours(5)));
        assert_eq!(m.target_date, before);
        assert_eq!(outcome.penalty(), Duration::zero());
        assert_eq!(m.time_remaining_hours, Some(39.0));
    }

    #[test]
    fn test_relapse_applies_to_whole_catalog() {
        let engine = RegressionEngine::new();
        let mut set = Milestone::fresh_catalog(t0());
        engine.advance_all(&mut set, t0() + Duration::hours(30));
        let achieved = set.iter().filter(|m| m.is_completed).count();
        assert!(achieved > 0);

        let relapse_at = t0() + Duration::hours(31);
        let outcomes = engine.apply_relapse_to_all(&mut set, &RegressionEvent::at(relapse_at));
        assert_eq!(outcomes.len(), MilestoneKind::ALL.len());
        assert_eq!(outcomes.iter().filter(|o| o.regressed).count(), achieved);

        for m in &set {
            assert_eq!(m.current_progress, 0.0);
            assert!(!m.is_completed);
            assert_eq!(m.target_date, Some(relapse_at + m.kind.target_duration()));
            assert!(m.validate().is_ok());
        }
    }

    #[test]
    fn test_completed_is_sticky_until_relapse() {
        let engine = RegressionEngine::new();
        let mut m = day_milestone();
        engine.advance(&mut m, t0() + Duration::hours(25));
        assert_eq!(engine.advance(&mut m, t0() + Duration::hours(1)), Transition::Unchanged);
        assert!(m.is_completed);
        assert_eq!(m.current_progress, 100.0);
    }

    #[test]
    fn test_unknown_target() {
        let engine = RegressionEngine::new();
        let mut m = day_milestone();
        m.target_date = None;
        assert_eq!(engine.advance(&mut m, t0()), Transition::Unknown);
        assert_eq!(m.time_remaining_hours, None);
    }
}
