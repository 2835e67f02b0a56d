//! Smoke-free recovery core data models.
//!
//! This crate defines the milestone catalog and the data structures shared
//! by the progress engine, the milestone sources and the sync layer.

#![warn(missing_docs)]

// Core identities
mod id;

// Catalog and per-user state
mod catalog;
mod milestone;
mod event;
mod overview;

// Session plumbing
mod session;
mod clock;

// Re-exports
pub use id::*;

pub use catalog::{MilestoneKind, UnknownMilestoneKind, MS_PER_HOUR};
pub use milestone::{Milestone, MilestoneState, InvariantViolation};
pub use event::RegressionEvent;
pub use overview::HealthOverview;
pub use session::SessionContext;
pub use clock::{Clock, SystemClock, ManualClock};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
