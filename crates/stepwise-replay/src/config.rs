//! Playback configuration.

use std::time::Duration;

use tracing::warn;

/// Default delay between auto-played steps.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Default time a cancelled play loop gets to exit before it is aborted.
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_millis(250);

/// Default capacity of the playback event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Configuration shared by every controller a supervisor creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Delay per step at [`PlaybackSpeed::Normal`](crate::PlaybackSpeed::Normal).
    pub base_delay: Duration,

    /// How long to wait for a cancelled play loop to drain.
    pub cancel_grace: Duration,

    /// Events buffered per subscriber before slow subscribers start lagging.
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_STEP_DELAY,
            cancel_grace: DEFAULT_CANCEL_GRACE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl PlaybackConfig {
    /// Read overrides from the environment, falling back to defaults:
    ///
    /// - `STEPWISE_STEP_DELAY_MS`
    /// - `STEPWISE_CANCEL_GRACE_MS`
    /// - `STEPWISE_EVENT_CAPACITY`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_delay: env_millis("STEPWISE_STEP_DELAY_MS").unwrap_or(defaults.base_delay),
            cancel_grace: env_millis("STEPWISE_CANCEL_GRACE_MS").unwrap_or(defaults.cancel_grace),
            event_capacity: env_parse("STEPWISE_EVENT_CAPACITY")
                .filter(|&capacity: &usize| capacity > 0)
                .unwrap_or(defaults.event_capacity),
        }
    }

    /// Set the base step delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the cancellation grace period.
    #[must_use]
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    /// Set the event channel capacity (at least 1).
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env_parse(name).map(Duration::from_millis)
}

/// Parse an environment variable, warning when it is set but unparseable.
pub fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = PlaybackConfig::default()
            .with_base_delay(Duration::from_millis(40))
            .with_cancel_grace(Duration::from_millis(5))
            .with_event_capacity(0);

        assert_eq!(config.base_delay, Duration::from_millis(40));
        assert_eq!(config.cancel_grace, Duration::from_millis(5));
        assert_eq!(config.event_capacity, 1);
    }

    #[test]
    fn env_overrides_are_read() {
        std::env::set_var("STEPWISE_STEP_DELAY_MS", "75");
        std::env::set_var("STEPWISE_EVENT_CAPACITY", "not-a-number");
        let config = PlaybackConfig::from_env();
        std::env::remove_var("STEPWISE_STEP_DELAY_MS");
        std::env::remove_var("STEPWISE_EVENT_CAPACITY");

        assert_eq!(config.base_delay, Duration::from_millis(75));
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }
}
