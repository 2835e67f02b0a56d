//! Sync layer - keeps a user's milestone view fresh from a source.
//!
//! A [`HealthSession`] runs one refresh cycle at a time and falls back to an
//! offline estimate when the source is unreachable. A [`SyncScheduler`]
//! drives it on an interval.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod session;
pub mod scheduler;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use session::{DataOrigin, HealthSession, RefreshOutcome};
pub use scheduler::{SyncScheduler, MIN_REFRESH_INTERVAL};
