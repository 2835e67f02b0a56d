//! Sync configuration.

use std::str::FromStr;
use std::time::Duration;

use smokefree_progress::DEFAULT_OFFLINE_ANCHOR_OFFSET_HOURS;
use smokefree_source::DEFAULT_TIMEOUT;

/// Configuration for a sync session and its scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// How often to refresh from the authoritative source
    pub refresh_interval: Duration,
    /// How often the live countdown is redrawn
    pub tick_interval: Duration,
    /// Synthetic anchor offset for offline estimates
    pub offline_anchor_offset: chrono::Duration,
    /// Remote backend base URL; `None` uses the local source
    pub remote_url: Option<String>,
    /// Bearer token for the remote backend
    pub auth_token: Option<String>,
    /// Per-request timeout for the remote backend
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60),
            tick_interval: Duration::from_secs(1),
            offline_anchor_offset: chrono::Duration::hours(DEFAULT_OFFLINE_ANCHOR_OFFSET_HOURS),
            remote_url: None,
            auth_token: None,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SyncConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from `SMOKEFREE_*` environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).and_then(|v| parse_value::<u64>(&v));
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            refresh_interval: parse("SMOKEFREE_REFRESH_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
            tick_interval: parse("SMOKEFREE_TICK_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            offline_anchor_offset: parse("SMOKEFREE_OFFLINE_OFFSET_HOURS")
                .and_then(|hours| i64::try_from(hours).ok())
                .map(chrono::Duration::hours)
                .unwrap_or(defaults.offline_anchor_offset),
            remote_url: non_empty("SMOKEFREE_REMOTE_URL"),
            auth_token: non_empty("SMOKEFREE_TOKEN"),
            request_timeout: parse("SMOKEFREE_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    /// Set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the countdown tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the remote backend.
    pub fn with_remote(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Set the auth token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

fn parse_value<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.offline_anchor_offset, chrono::Duration::hours(48));
        assert!(config.remote_url.is_none());
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_lookup_overrides() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("SMOKEFREE_REFRESH_SECS", "15"),
            ("SMOKEFREE_TICK_MS", "250"),
            ("SMOKEFREE_OFFLINE_OFFSET_HOURS", "72"),
            ("SMOKEFREE_REMOTE_URL", "https://api.example.com"),
            ("SMOKEFREE_TOKEN", "secret"),
        ]));
        assert_eq!(config.refresh_interval, Duration::from_secs(15));
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.offline_anchor_offset, chrono::Duration::hours(72));
        assert_eq!(config.remote_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("SMOKEFREE_REFRESH_SECS", "soon"),
            ("SMOKEFREE_TICK_MS", "0"),
            ("SMOKEFREE_REMOTE_URL", "  "),
        ]));
        assert_eq!(config, SyncConfig::default());
    }
}
