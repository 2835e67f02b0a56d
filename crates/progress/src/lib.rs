//! Milestone progress engine.
//!
//! Progress computation, the relapse penalty state machine, live countdown
//! interpolation, overview aggregation and offline estimation.

#![warn(missing_docs)]

pub mod computer;
pub mod regression;
pub mod countdown;
pub mod overview;
pub mod estimator;

pub use computer::{ProgressComputer, ProgressComputation};
pub use regression::{RegressionEngine, RelapseOutcome, Transition};
pub use countdown::{CountdownInterpolator, Countdown, Baseline};
pub use overview::OverviewAggregator;
pub use estimator::{OfflineEstimator, OfflineEstimate, DEFAULT_OFFLINE_ANCHOR_OFFSET_HOURS};
