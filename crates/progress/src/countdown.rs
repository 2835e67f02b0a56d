//! Live countdown interpolation between authoritative refreshes.
//!
//! Each authoritative refresh captures a `(remaining, captured_at)` baseline
//! per milestone. Ticks extrapolate from that baseline locally, so the
//! countdown stays second-accurate without a network call per second. Drift
//! is bounded by one polling interval.

use std::collections::HashMap;

use smokefree_core::{Milestone, MilestoneId, Time, MS_PER_HOUR};

/// Authoritative remaining time captured at a known instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// Remaining hours reported by the authoritative refresh
    pub captured_remaining_hours: f64,
    /// When the refresh was applied
    pub captured_at: Time,
}

impl Baseline {
    fn remaining_ms_at(&self, now: Time) -> i64 {
        let baseline_ms = (self.captured_remaining_hours * MS_PER_HOUR).round() as i64;
        let elapsed_ms = (now - self.captured_at).num_milliseconds().max(0);
        (baseline_ms - elapsed_ms).max(0)
    }
}

/// An extrapolated remaining duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Countdown {
    /// Remaining milliseconds, never negative
    pub remaining_ms: i64,
}

impl Countdown {
    /// Whole hours left.
    pub fn hours(&self) -> i64 {
        self.remaining_ms / 3_600_000
    }

    /// Minutes left past the whole hours.
    pub fn minutes(&self) -> i64 {
        (self.remaining_ms / 60_000) % 60
    }

    /// Seconds left past the whole minutes.
    pub fn seconds(&self) -> i64 {
        (self.remaining_ms / 1_000) % 60
    }

    /// Remaining time as fractional hours.
    pub fn as_hours(&self) -> f64 {
        self.remaining_ms as f64 / MS_PER_HOUR
    }

    /// The countdown ran out; completion awaits the next authoritative refresh.
    pub fn is_locally_complete(&self) -> bool {
        self.remaining_ms == 0
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h {:02}m {:02}s", self.hours(), self.minutes(), self.seconds())
    }
}

/// Per-milestone countdown baselines.
#[derive(Debug, Clone, Default)]
pub struct CountdownInterpolator {
    baselines: HashMap<MilestoneId, Baseline>,
}

impl CountdownInterpolator {
    /// Create an empty interpolator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the baseline for `id`.
    pub fn on_authoritative_update(&mut self, id: MilestoneId, remaining_hours: f64, now: Time) {
        self.baselines.insert(
            id,
            Baseline {
                captured_remaining_hours: remaining_hours.max(0.0),
                captured_at: now,
            },
        );
    }

    /// Capture a baseline from a refreshed milestone.
    ///
    /// Completed milestones and milestones with unknown remaining time have
    /// no countdown; any earlier baseline for them is dropped.
    pub fn observe(&mut self, milestone: &Milestone, now: Time) {
        match milestone.time_remaining_hours {
            Some(hours) if !milestone.is_completed => {
                self.on_authoritative_update(milestone.id, hours, now)
            }
            _ => self.discard(milestone.id),
        }
    }

    /// Capture baselines for a whole refreshed set.
    ///
    /// Baselines for milestones no longer present are dropped.
    pub fn observe_all(&mut self, milestones: &[Milestone], now: Time) {
        self.baselines
            .retain(|id, _| milestones.iter().any(|m| m.id == *id));
        for milestone in milestones {
            self.observe(milestone, now);
        }
    }

    /// Extrapolate the remaining time for `id` at `now`.
    pub fn tick(&self, id: MilestoneId, now: Time) -> Option<Countdown> {
        self.baselines.get(&id).map(|baseline| Countdown {
            remaining_ms: baseline.remaining_ms_at(now),
        })
    }

    /// Drop the baseline for `id`.
    pub fn discard(&mut self, id: MilestoneId) {
        self.baselines.remove(&id);
    }

    /// Current baseline for `id`.
    pub fn baseline(&self, id: MilestoneId) -> Option<&Baseline> {
        self.baselines.get(&id)
    }

    /// Number of live baselines.
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    /// No live baselines.
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }

    /// Drop every baseline.
    pub fn clear(&mut self) {
        self.baselines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use smokefree_core::MilestoneKind;

    fn t0() -> Time {
        Utc.with_ymd_and_hms(2026, 5, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_converges_to_zero() {
        let mut interp = CountdownInterpolator::new();
        let id = MilestoneId::new();
        interp.on_authoritative_update(id, 2.5, t0());

        let at_target = t0() + Duration::milliseconds((2.5 * MS_PER_HOUR) as i64);
        let countdown = interp.tick(id, at_target).unwrap();
        assert_eq!(countdown.remaining_ms, 0);
        assert!(countdown.is_locally_complete());

        let past = interp.tick(id, at_target + Duration::hours(5)).unwrap();
        assert_eq!(past.remaining_ms, 0);
    }

    #[test]
    fn test_monotonically_non_increasing() {
        let mut interp = CountdownInterpolator::new();
        let id = MilestoneId::new();
        interp.on_authoritative_update(id, 1.0, t0());

        let mut previous = i64::MAX;
        for second in 0..4_000 {
            let countdown = interp.tick(id, t0() + Duration::seconds(second)).unwrap();
            assert!(countdown.remaining_ms <= previous);
            assert!(countdown.remaining_ms >= 0);
            previous = countdown.remaining_ms;
        }
    }

    #[test]
    fn test_hms_breakdown() {
        let mut interp = CountdownInterpolator::new();
        let id = MilestoneId::new();
        interp.on_authoritative_update(id, 12.0, t0());

        let countdown = interp
            .tick(id, t0() + Duration::minutes(90) + Duration::seconds(15))
            .unwrap();
        assert_eq!(countdown.hours(), 10);
        assert_eq!(countdown.minutes(), 29);
        assert_eq!(countdown.seconds(), 45);
        assert_eq!(countdown.to_string(), "10h 29m 45s");
    }

    #[test]
    fn test_new_baseline_replaces_old() {
        let mut interp = CountdownInterpolator::new();
        let id = MilestoneId::new();
        interp.on_authoritative_update(id, 10.0, t0());
        interp.on_authoritative_update(id, 3.0, t0() + Duration::hours(1));

        assert_eq!(interp.len(), 1);
        let countdown = interp.tick(id, t0() + Duration::hours(1)).unwrap();
        assert_eq!(countdown.remaining_ms, 3 * 3_600_000);
    }

    #[test]
    fn test_completed_and_unknown_are_not_interpolated() {
        let mut interp = CountdownInterpolator::new();
        let mut m = Milestone::fresh(MilestoneKind::OxygenLevel, t0());
        interp.observe(&m, t0());
        assert!(interp.tick(m.id, t0()).is_some());

        m.is_completed = true;
        m.current_progress = 100.0;
        interp.observe(&m, t0());
        assert!(interp.tick(m.id, t0()).is_none());

        m.is_completed = false;
        m.time_remaining_hours = None;
        interp.observe(&m, t0());
        assert!(interp.is_empty());
    }

    #[test]
    fn test_observe_all_drops_unmounted() {
        let mut interp = CountdownInterpolator::new();
        let first = Milestone::fresh_catalog(t0());
        interp.observe_all(&first, t0());
        assert_eq!(interp.len(), first.len());

        let second = Milestone::fresh_catalog(t0());
        interp.observe_all(&second[..3], t0());
        assert_eq!(interp.len(), 3);
        assert!(interp.tick(first[0].id, t0()).is_none());
        assert!(interp.tick(second[0].id, t0()).is_some());
    }
}
