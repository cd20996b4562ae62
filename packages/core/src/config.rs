//! Watcher configuration.

use std::time::Duration;

use crate::WatchError;

/// Default poll interval shared by all jobs.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3_000);

/// Default time to wait for a terminal answer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Watcher-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Tick period of the shared polling loop.
    pub interval: Duration,
    /// Timeout applied when a registration does not set one.
    pub default_timeout: Duration,
    /// Capacity of the global event broadcast channel.
    pub event_capacity: usize,
    /// Optional actor name; names must be unique within the process.
    pub name: Option<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            default_timeout: DEFAULT_TIMEOUT,
            event_capacity: 256,
            name: None,
        }
    }
}

impl WatcherConfig {
    /// Set the shared poll interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the default per-job timeout.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Name the watcher actor.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Options for a registration that uses this config's defaults.
    pub fn default_options(&self) -> WatchOptions {
        WatchOptions {
            timeout: self.default_timeout,
        }
    }

    /// Build a config from environment variables.
    ///
    /// - `JOB_WATCH_INTERVAL_MS` (default: 3000)
    /// - `JOB_WATCH_TIMEOUT_MS` (default: 120000)
    /// - `JOB_WATCH_EVENT_CAPACITY` (default: 256)
    pub fn from_env() -> Result<Self, WatchError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WatchError> {
        let mut config = Self::default();

        if let Some(ms) = parse_var(&lookup, "JOB_WATCH_INTERVAL_MS")? {
            config.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "JOB_WATCH_TIMEOUT_MS")? {
            config.default_timeout = Duration::from_millis(ms);
        }
        if let Some(capacity) = parse_var(&lookup, "JOB_WATCH_EVENT_CAPACITY")? {
            config.event_capacity = capacity as usize;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the polling loop cannot run with.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.interval.is_zero() {
            return Err(WatchError::InvalidConfig("interval must be positive".into()));
        }
        if self.event_capacity == 0 {
            return Err(WatchError::InvalidConfig(
                "event capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<u64>, WatchError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| WatchError::InvalidConfig(format!("{}={:?}: {}", name, raw, e))),
    }
}

/// Per-registration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Maximum time to wait for a terminal answer.
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WatchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_product_polling() {
        let config = WatcherConfig::default();
        assert_eq!(config.interval, Duration::from_secs(3));
        assert_eq!(config.default_timeout, Duration::from_secs(120));
        assert_eq!(WatchOptions::default().timeout, Duration::from_secs(120));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = WatcherConfig::from_lookup(lookup(&[
            ("JOB_WATCH_INTERVAL_MS", "500"),
            ("JOB_WATCH_TIMEOUT_MS", " 60000 "),
        ]))
        .unwrap();
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.default_timeout, Duration::from_secs(60));
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn env_rejects_garbage_and_zero_interval() {
        let err = WatcherConfig::from_lookup(lookup(&[("JOB_WATCH_INTERVAL_MS", "soon")]));
        assert!(matches!(err, Err(WatchError::InvalidConfig(_))));

        let err = WatcherConfig::from_lookup(lookup(&[("JOB_WATCH_INTERVAL_MS", "0")]));
        assert!(matches!(err, Err(WatchError::InvalidConfig(_))));
    }

    #[test]
    fn default_options_follow_config() {
        let config = WatcherConfig::default().with_default_timeout(Duration::from_millis(50));
        assert_eq!(config.default_options().timeout, Duration::from_millis(50));
    }
}
