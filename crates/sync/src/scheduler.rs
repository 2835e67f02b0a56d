//! Periodic refresh scheduling.

use std::sync::Arc;
use std::time::Duration;

use smokefree_source::MilestoneSource;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::session::{HealthSession, RefreshOutcome};

/// Shortest refresh interval the scheduler will run with.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Drives [`HealthSession::refresh`] on a fixed interval.
///
/// The first refresh fires as soon as the scheduler starts. Ticks that land
/// while a refresh is still in flight are dropped by the session, so a slow
/// source never piles up requests. Stopping the scheduler ends future ticks;
/// a refresh already in flight runs to completion.
pub struct SyncScheduler<S: MilestoneSource + 'static> {
    session: Arc<HealthSession<S>>,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl<S: MilestoneSource + 'static> SyncScheduler<S> {
    /// Create a stopped scheduler for `session`.
    pub fn new(session: Arc<HealthSession<S>>) -> Self {
        Self {
            session,
            shutdown: None,
            handle: None,
        }
    }

    /// The scheduled session.
    pub fn session(&self) -> &Arc<HealthSession<S>> {
        &self.session
    }

    /// Whether the refresh loop is running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start refreshing every `interval`. Restarts the loop if already running.
    ///
    /// Intervals below [`MIN_REFRESH_INTERVAL`] are raised to it.
    pub fn start(&mut self, interval: Duration) {
        self.signal_shutdown();

        let interval = if interval < MIN_REFRESH_INTERVAL {
            warn!("Refresh interval {:?} too short, using {:?}", interval, MIN_REFRESH_INTERVAL);
            MIN_REFRESH_INTERVAL
        } else {
            interval
        };

        let (tx, mut rx) = watch::channel(false);
        let session = self.session.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let session = session.clone();
                        tokio::spawn(async move {
                            if let RefreshOutcome::Skipped = session.refresh().await {
                                debug!("Scheduled refresh skipped, previous one still running");
                            }
                        });
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            info!("Sync scheduler shutting down");
                            break;
                        }
                    }
                }
            }
        });

        info!("Sync scheduler started, refreshing every {:?}", interval);
        self.shutdown = Some(tx);
        self.handle = Some(handle);
    }

    /// Stop the loop and wait for it to exit.
    pub async fn stop(&mut self) {
        self.signal_shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Run a refresh right away, outside the schedule.
    pub fn trigger_now(&self) -> JoinHandle<RefreshOutcome> {
        let session = self.session.clone();
        tokio::spawn(async move { session.refresh().await })
    }

    fn signal_shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
    }
}

impl<S: MilestoneSource + 'static> Drop for SyncScheduler<S> {
    fn drop(&mut self) {
        self.signal_shutdown();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
