//! Offline milestone estimation.
//!
//! When the authoritative source cannot be reached, the estimator rebuilds a
//! complete milestone set locally with the same arithmetic the source uses.

use chrono::Duration;
use smokefree_core::{HealthOverview, Milestone, SessionContext, Time};
use tracing::debug;

use crate::overview::OverviewAggregator;
use crate::regression::RegressionEngine;

/// Synthetic quit anchor offset used when the real anchor is unknown.
pub const DEFAULT_OFFLINE_ANCHOR_OFFSET_HOURS: i64 = 48;

/// A locally estimated milestone set.
#[derive(Debug, Clone)]
pub struct OfflineEstimate {
    /// Anchor the estimate was measured from
    pub anchor: Time,
    /// Whether `anchor` is synthetic
    pub synthetic_anchor: bool,
    /// One milestone per catalog kind
    pub milestones: Vec<Milestone>,
    /// Summary of `milestones`
    pub overview: HealthOverview,
}

/// Offline estimator.
#[derive(Debug, Clone)]
pub struct OfflineEstimator {
    anchor_offset: Duration,
    engine: RegressionEngine,
    aggregator: OverviewAggregator,
}

impl OfflineEstimator {
    /// Create an estimator with a custom synthetic anchor offset.
    pub fn new(anchor_offset: Duration) -> Self {
        Self {
            anchor_offset,
            engine: RegressionEngine::new(),
            aggregator: OverviewAggregator,
        }
    }

    /// The synthetic anchor offset.
    pub fn anchor_offset(&self) -> Duration {
        self.anchor_offset
    }

    /// The anchor an estimate at `now` would use.
    pub fn anchor_for(&self, session: &SessionContext, now: Time) -> Time {
        session.quit_anchor.unwrap_or(now - self.anchor_offset)
    }

    /// Estimate the full milestone set and overview at `now`.
    pub fn estimate(&self, session: &SessionContext, now: Time) -> OfflineEstimate {
        let anchor = self.anchor_for(session, now);
        let mut milestones = Milestone::fresh_catalog(anchor);
        self.engine.advance_all(&mut milestones, now);
        let overview = self.aggregator.aggregate(&milestones);

        debug!(
            "Offline estimate from {} (synthetic={}): {}/{} complete",
            anchor,
            session.quit_anchor.is_none(),
            overview.completed_metrics,
            overview.total_metrics
        );

        OfflineEstimate {
            anchor,
            synthetic_anchor: session.quit_anchor.is_none(),
            milestones,
            overview,
        }
    }
}

impl Default for OfflineEstimator {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_OFFLINE_ANCHOR_OFFSET_HOURS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProgressComputer;
    use chrono::TimeZone;
    use chrono::Utc;
    use smokefree_core::MilestoneKind;

    fn now() -> Time {
        Utc.with_ymd_and_hms(2026, 7, 20, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_estimate_covers_every_kind_with_valid_progress() {
        let estimate = OfflineEstimator::default().estimate(&SessionContext::default(), now());

        assert!(estimate.synthetic_anchor);
        assert_eq!(estimate.anchor, now() - Duration::hours(48));
        assert_eq!(estimate.milestones.len(), 16);
        for (m, kind) in estimate.milestones.iter().zip(MilestoneKind::ALL) {
            assert_eq!(m.kind, kind);
            assert!((0.0..=100.0).contains(&m.current_progress));
            assert!(m.validate().is_ok());
        }
        assert_eq!(estimate.overview.total_metrics, 16);
    }

    #[test]
    fn test_estimate_uses_real_anchor_when_known() {
        let anchor = now() - Duration::hours(12);
        let session = SessionContext::default().with_quit_anchor(anchor);
        let estimate = OfflineEstimator::default().estimate(&session, now());

        assert!(!estimate.synthetic_anchor);
        let day = estimate
            .milestones
            .iter()
            .find(|m| m.kind == MilestoneKind::HeartAttackRisk)
            .unwrap();
        assert_eq!(day.current_progress, 50.0);
        assert_eq!(day.time_remaining_hours, Some(12.0));
    }

    #[test]
    fn test_matches_progress_computer() {
        let estimator = OfflineEstimator::new(Duration::hours(100));
        let estimate = estimator.estimate(&SessionContext::default(), now());

        for m in &estimate.milestones {
            let expected = ProgressComputer.compute(estimate.anchor, m.target_duration_hours(), now());
            assert_eq!(m.current_progress.to_bits(), expected.progress.to_bits());
            assert_eq!(m.is_completed, expected.completed);
        }
    }
}
