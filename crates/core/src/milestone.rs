//! Milestone model - the mutable per-user unit of recovery progress.

use serde::{Deserialize, Serialize};
use crate::catalog::MilestoneKind;
use crate::id::MilestoneId;
use crate::Time;

/// A tracked recovery milestone for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Unique identifier
    pub id: MilestoneId,

    /// Which catalog entry this tracks
    pub kind: MilestoneKind,

    /// Percentage complete (0-100)
    pub current_progress: f64,

    /// Effective deadline: anchor + target duration + accumulated penalty
    pub target_date: Option<Time>,

    /// When the milestone was reached under its current target
    pub achieved_date: Option<Time>,

    /// Reached and not regressed since
    pub is_completed: bool,

    /// A relapse invalidated an earlier achievement
    pub has_regressed: bool,

    /// Remaining hours as of the last computation
    pub time_remaining_hours: Option<f64>,

    /// Reached at least once, even if later regressed
    #[serde(default)]
    pub previously_achieved: bool,
}

impl Milestone {
    /// Materialize a fresh milestone measured from `quit_anchor`.
    pub fn fresh(kind: MilestoneKind, quit_anchor: Time) -> Self {
        Self {
            id: MilestoneId::new(),
            kind,
            current_progress: 0.0,
            target_date: Some(quit_anchor + kind.target_duration()),
            achieved_date: None,
            is_completed: false,
            has_regressed: false,
            time_remaining_hours: Some(kind.target_duration_hours()),
            previously_achieved: false,
        }
    }

    /// Materialize one fresh milestone per catalog kind.
    pub fn fresh_catalog(quit_anchor: Time) -> Vec<Self> {
        MilestoneKind::ALL
            .iter()
            .map(|kind| Self::fresh(*kind, quit_anchor))
            .collect()
    }

    /// Target duration of the underlying kind, in hours.
    pub fn target_duration_hours(&self) -> f64 {
        self.kind.target_duration_hours()
    }

    /// The instant progress is currently measured from.
    ///
    /// This is the quit anchor until a relapse restarts the milestone, after
    /// which it is the relapse time.
    pub fn effective_anchor(&self) -> Option<Time> {
        self.target_date.map(|target| target - self.kind.target_duration())
    }

    /// Strictly between zero and one hundred percent.
    pub fn is_in_progress(&self) -> bool {
        self.current_progress > 0.0 && self.current_progress < 100.0
    }

    /// Current position in the regression state machine.
    pub fn state(&self) -> MilestoneState {
        if self.is_completed {
            MilestoneState::Achieved
        } else if self.has_regressed {
            MilestoneState::Regressed
        } else if self.current_progress > 0.0 {
            MilestoneState::InProgress
        } else {
            MilestoneState::Fresh
        }
    }

    /// Check the model invariants.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if !(0.0..=100.0).contains(&self.current_progress) {
            return Err(InvariantViolation::ProgressOutOfRange {
                kind: self.kind,
                progress: self.current_progress,
            });
        }
        if self.is_completed {
            if self.current_progress < 100.0 {
                return Err(InvariantViolation::CompletedBelowFull(self.kind));
            }
            if self.achieved_date.is_none() {
                return Err(InvariantViolation::CompletedWithoutDate(self.kind));
            }
        }
        if self.has_regressed {
            if self.current_progress != 0.0 {
                return Err(InvariantViolation::RegressedWithProgress(self.kind));
            }
            if self.achieved_date.is_some() {
                return Err(InvariantViolation::RegressedWithAchievement(self.kind));
            }
        }
        if let Some(hours) = self.time_remaining_hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(InvariantViolation::NegativeRemaining(self.kind));
            }
        }
        Ok(())
    }
}

/// States of the regression state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneState {
    /// No progress yet
    Fresh,
    /// Progressing toward the target
    InProgress,
    /// Target reached
    Achieved,
    /// A relapse undid an earlier achievement
    Regressed,
}

impl MilestoneState {
    /// Status text for display.
    pub fn label(self) -> &'static str {
        match self {
            MilestoneState::Fresh => "Not started",
            MilestoneState::InProgress => "In progress",
            MilestoneState::Achieved => "Achieved",
            MilestoneState::Regressed => "Regressed",
        }
    }
}

impl std::fmt::Display for MilestoneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A broken milestone invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    /// Progress outside [0, 100]
    #[error("{kind}: progress {progress} outside 0..=100")]
    ProgressOutOfRange {
        /// Offending kind
        kind: MilestoneKind,
        /// Reported progress
        progress: f64,
    },

    /// Completed but not at 100%
    #[error("{0}: completed below 100%")]
    CompletedBelowFull(MilestoneKind),

    /// Completed without an achievement date
    #[error("{0}: completed without an achieved date")]
    CompletedWithoutDate(MilestoneKind),

    /// Regressed but still carrying progress
    #[error("{0}: regressed with non-zero progress")]
    RegressedWithProgress(MilestoneKind),

    /// Regressed but still carrying an achievement date
    #[error("{0}: regressed with an achieved date")]
    RegressedWithAchievement(MilestoneKind),

    /// Remaining time negative or not a number
    #[error("{0}: invalid remaining time")]
    NegativeRemaining(MilestoneKind),
}
