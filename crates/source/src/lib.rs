//! Milestone sources for the recovery engine.
//!
//! This crate provides the trait the sync layer refreshes from, an
//! in-process authoritative implementation, an HTTP client for a remote
//! backend, and a JSON file store for local state.

#![warn(missing_docs)]

pub mod trait_;
pub mod local;
pub mod http;
pub mod json_storage;

pub use trait_::{MilestoneSource, SourceError, Result};
pub use local::{LocalSource, SourceState};
pub use http::{HttpSource, DEFAULT_TIMEOUT};
pub use json_storage::JsonStateStore;
