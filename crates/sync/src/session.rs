//! Per-user health session: one refresh cycle and the read-only views.
//!
//! A refresh runs:
//! ```text
//! trigger_recompute → fetch milestones + overview → validate → apply
//!                         └─ unreachable → offline estimate → apply
//! ```
//! A refresh either applies a complete authoritative set or a complete
//! estimated set. Anything else leaves the previous set in place.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use smokefree_core::{
    Clock, HealthOverview, Milestone, MilestoneKind, SessionContext, Time,
};
use smokefree_progress::{Countdown, CountdownInterpolator, OfflineEstimator, OverviewAggregator};
use smokefree_source::MilestoneSource;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

/// Where the currently displayed data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// Nothing loaded yet
    Empty,
    /// Fetched from the authoritative source
    Authoritative,
    /// Estimated locally while the source was unreachable
    Estimated,
}

/// Result of one refresh attempt.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// Another refresh was in flight; this one was dropped
    Skipped,
    /// Authoritative data applied
    Authoritative {
        /// The recompute step failed but the fetch succeeded
        recompute_failed: bool,
    },
    /// Source unreachable; estimated data applied
    Estimated,
    /// Data rejected; previous data kept
    Rejected(Arc<SyncError>),
}

#[derive(Debug)]
struct SessionView {
    milestones: Vec<Milestone>,
    overview: HealthOverview,
    origin: DataOrigin,
    refreshed_at: Option<Time>,
    last_error: Option<Arc<SyncError>>,
    countdowns: CountdownInterpolator,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            milestones: Vec::new(),
            overview: HealthOverview::default(),
            origin: DataOrigin::Empty,
            refreshed_at: None,
            last_error: None,
            countdowns: CountdownInterpolator::new(),
        }
    }
}

/// Clears the in-flight latch when the refresh ends or is dropped.
struct RefreshGuard<'a>(&'a AtomicBool);

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A user's milestone view, kept fresh from a [`MilestoneSource`].
pub struct HealthSession<S: MilestoneSource> {
    source: Arc<S>,
    context: SessionContext,
    clock: Arc<dyn Clock>,
    estimator: OfflineEstimator,
    aggregator: OverviewAggregator,
    refreshing: AtomicBool,
    view: RwLock<SessionView>,
}

impl<S: MilestoneSource> HealthSession<S> {
    /// Create a session with default settings.
    pub fn new(source: Arc<S>, context: SessionContext, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            context,
            clock,
            estimator: OfflineEstimator::default(),
            aggregator: OverviewAggregator,
            refreshing: AtomicBool::new(false),
            view: RwLock::new(SessionView::default()),
        }
    }

    /// Create a session using the offline settings from `config`.
    pub fn with_config(
        source: Arc<S>,
        context: SessionContext,
        clock: Arc<dyn Clock>,
        config: &SyncConfig,
    ) -> Self {
        Self::new(source, context, clock)
            .with_estimator(OfflineEstimator::new(config.offline_anchor_offset))
    }

    /// Replace the offline estimator.
    pub fn with_estimator(mut self, estimator: OfflineEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Run one refresh cycle.
    ///
    /// At most one cycle runs at a time; a call made while another is in
    /// flight returns [`RefreshOutcome::Skipped`] immediately.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            debug!("Refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        };

        debug!("Refreshing milestones for user {}", self.context.user_id);

        // A failed recompute must not stop the fetch.
        let recompute_error = match self.source.trigger_recompute().await {
            Ok(()) => None,
            Err(e) => {
                warn!("Recompute failed: {}", e);
                Some(e)
            }
        };

        let fetched = tokio::try_join!(self.source.fetch_milestones(), self.source.fetch_overview());

        match fetched {
            Ok((milestones, remote_overview)) => match validate_set(&milestones) {
                Ok(()) => {
                    let recompute_failed = recompute_error.is_some();
                    let last_error = recompute_error
                        .filter(|e| !e.is_connectivity())
                        .map(|e| Arc::new(SyncError::from(e)));
                    self.apply_authoritative(milestones, &remote_overview, last_error);
                    RefreshOutcome::Authoritative { recompute_failed }
                }
                Err(e) => self.reject(e),
            },
            Err(e) if e.is_connectivity() => {
                warn!("Milestone source unreachable, using offline estimate: {}", e);
                self.apply_estimate();
                RefreshOutcome::Estimated
            }
            Err(e) => self.reject(SyncError::from(e)),
        }
    }

    fn apply_authoritative(
        &self,
        milestones: Vec<Milestone>,
        remote_overview: &HealthOverview,
        last_error: Option<Arc<SyncError>>,
    ) {
        let now = self.clock.now();
        let overview = self.aggregator.aggregate(&milestones);
        if overview.completed_metrics != remote_overview.completed_metrics
            || overview.total_metrics != remote_overview.total_metrics
        {
            debug!(
                "Remote overview disagrees with milestones ({}/{} vs {}/{}), using milestones",
                remote_overview.completed_metrics,
                remote_overview.total_metrics,
                overview.completed_metrics,
                overview.total_metrics
            );
        }

        let mut view = self.write_view();
        view.countdowns.observe_all(&milestones, now);
        view.milestones = milestones;
        view.overview = overview;
        view.origin = DataOrigin::Authoritative;
        view.refreshed_at = Some(now);
        view.last_error = last_error;
        info!(
            "Applied authoritative milestones: {}/{} complete",
            view.overview.completed_metrics, view.overview.total_metrics
        );
    }

    fn apply_estimate(&self) {
        let now = self.clock.now();
        let estimate = self.estimator.estimate(&self.context, now);

        let mut view = self.write_view();
        view.countdowns.observe_all(&estimate.milestones, now);
        view.milestones = estimate.milestones;
        view.overview = estimate.overview;
        view.origin = DataOrigin::Estimated;
        view.refreshed_at = Some(now);
        view.last_error = None;
    }

    fn reject(&self, error: SyncError) -> RefreshOutcome {
        warn!("Refresh rejected, keeping previous milestones: {}", error);
        let error = Arc::new(error);
        self.write_view().last_error = Some(error.clone());
        RefreshOutcome::Rejected(error)
    }

    fn read_view(&self) -> RwLockReadGuard<'_, SessionView> {
        self.view.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_view(&self) -> RwLockWriteGuard<'_, SessionView> {
        self.view.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // === Read accessors ===

    /// The session context.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Whether a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// All milestones, in source order.
    pub fn milestones(&self) -> Vec<Milestone> {
        self.read_view().milestones.clone()
    }

    /// The milestone for `kind`.
    pub fn milestone_by_kind(&self, kind: MilestoneKind) -> Option<Milestone> {
        self.read_view().milestones.iter().find(|m| m.kind == kind).cloned()
    }

    /// Achieved milestones.
    pub fn completed(&self) -> Vec<Milestone> {
        self.read_view()
            .milestones
            .iter()
            .filter(|m| m.is_completed)
            .cloned()
            .collect()
    }

    /// Milestones strictly between 0% and 100%.
    pub fn in_progress(&self) -> Vec<Milestone> {
        self.read_view()
            .milestones
            .iter()
            .filter(|m| m.is_in_progress())
            .cloned()
            .collect()
    }

    /// Milestones still to reach, soonest first.
    pub fn upcoming(&self) -> Vec<Milestone> {
        self.read_view().overview.upcoming_milestones.clone()
    }

    /// The aggregate overview.
    pub fn overview(&self) -> HealthOverview {
        self.read_view().overview.clone()
    }

    /// Where the current data came from.
    pub fn origin(&self) -> DataOrigin {
        self.read_view().origin
    }

    /// When data was last applied.
    pub fn refreshed_at(&self) -> Option<Time> {
        self.read_view().refreshed_at
    }

    /// The most recent recoverable error, cleared by the next clean refresh.
    pub fn last_error(&self) -> Option<Arc<SyncError>> {
        self.read_view().last_error.clone()
    }

    /// Live remaining time for `kind`, extrapolated to the clock's now.
    pub fn countdown(&self, kind: MilestoneKind) -> Option<Countdown> {
        let now = self.clock.now();
        let view = self.read_view();
        let milestone = view.milestones.iter().find(|m| m.kind == kind)?;
        view.countdowns.tick(milestone.id, now)
    }

    /// Live remaining time for every milestone that has a countdown.
    pub fn countdowns(&self) -> Vec<(MilestoneKind, Countdown)> {
        let now = self.clock.now();
        let view = self.read_view();
        view.milestones
            .iter()
            .filter_map(|m| view.countdowns.tick(m.id, now).map(|c| (m.kind, c)))
            .collect()
    }
}

/// Check that a fetched set covers the catalog exactly once and holds the
/// milestone invariants.
fn validate_set(milestones: &[Milestone]) -> Result<()> {
    let mut seen = HashSet::new();
    for milestone in milestones {
        milestone.validate()?;
        if !seen.insert(milestone.kind) {
            return Err(SyncError::Duplicate(milestone.kind));
        }
    }

    let missing: Vec<MilestoneKind> = MilestoneKind::ALL
        .iter()
        .copied()
        .filter(|kind| !seen.contains(kind))
        .collect();
    if !missing.is_empty() {
        return Err(SyncError::Incomplete {
            found: milestones.len(),
            missing,
        });
    }
    Ok(())
}
