//! In-process authoritative source.
//!
//! Owns the user's milestone set and applies the same computation a remote
//! backend would: recompute on request, penalize on relapse, and rebuild the
//! whole set when the quit anchor is reset.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use smokefree_core::{
    Clock, HealthOverview, Milestone, RegressionEvent, SessionContext, Time,
};
use smokefree_progress::{OverviewAggregator, RegressionEngine, RelapseOutcome, Transition};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{MilestoneSource, Result, SourceError};

/// Serializable state of a [`LocalSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceState {
    /// Session the milestones belong to
    pub session: SessionContext,

    /// One milestone per catalog kind, or empty before the first quit
    pub milestones: Vec<Milestone>,

    /// Relapses applied so far
    #[serde(default)]
    pub relapse_count: u32,

    /// Last recompute
    pub recomputed_at: Option<Time>,
}

impl SourceState {
    /// Fresh state for a session.
    pub fn new(session: SessionContext) -> Self {
        let milestones = session
            .quit_anchor
            .map(Milestone::fresh_catalog)
            .unwrap_or_default();
        Self {
            session,
            milestones,
            relapse_count: 0,
            recomputed_at: None,
        }
    }
}

/// Authoritative milestone source living in the current process.
pub struct LocalSource {
    state: Mutex<SourceState>,
    clock: Arc<dyn Clock>,
    engine: RegressionEngine,
    aggregator: OverviewAggregator,
}

impl LocalSource {
    /// Create a source for `session`.
    pub fn new(session: SessionContext, clock: Arc<dyn Clock>) -> Self {
        Self::from_state(SourceState::new(session), clock)
    }

    /// Resume from saved state.
    pub fn from_state(state: SourceState, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(state),
            clock,
            engine: RegressionEngine::new(),
            aggregator: OverviewAggregator,
        }
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> SourceState {
        self.state.lock().await.clone()
    }

    /// Start a new quit attempt. The whole milestone set is recreated.
    pub async fn reset_quit_anchor(&self, anchor: Time) {
        let mut state = self.state.lock().await;
        state.session.quit_anchor = Some(anchor);
        state.milestones = Milestone::fresh_catalog(anchor);
        state.relapse_count = 0;
        state.recomputed_at = None;
        info!("Quit anchor reset to {}", anchor);
    }

    /// Apply a relapse to every milestone.
    pub async fn record_relapse(&self, event: &RegressionEvent) -> Result<Vec<RelapseOutcome>> {
        let mut state = self.state.lock().await;
        if state.session.quit_anchor.is_none() {
            return Err(SourceError::NoQuitAnchor);
        }
        let outcomes = self.engine.apply_relapse_to_all(&mut state.milestones, event);
        state.relapse_count += 1;
        Ok(outcomes)
    }
}

#[async_trait]
impl MilestoneSource for LocalSource {
    async fn fetch_overview(&self) -> Result<HealthOverview> {
        let state = self.state.lock().await;
        if state.session.quit_anchor.is_none() {
            return Err(SourceError::NoQuitAnchor);
        }
        Ok(self.aggregator.aggregate(&state.milestones))
    }

    async fn fetch_milestones(&self) -> Result<Vec<Milestone>> {
        let state = self.state.lock().await;
        if state.session.quit_anchor.is_none() {
            return Err(SourceError::NoQuitAnchor);
        }
        Ok(state.milestones.clone())
    }

    async fn trigger_recompute(&self) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let achieved = self
            .engine
            .advance_all(&mut state.milestones, now)
            .into_iter()
            .filter(|t| *t == Transition::Achieved)
            .count();
        state.recomputed_at = Some(now);
        debug!("Recomputed {} milestones, {} newly achieved", state.milestones.len(), achieved);
        Ok(())
    }
}
