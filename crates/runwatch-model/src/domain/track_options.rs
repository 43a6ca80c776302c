use std::time::Duration;

use crate::ModelError;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_MAX_TIMEOUT_SECS: u64 = 120;

/// Cadence and deadline of one poll loop.
///
/// Both values must be non-zero. They are validated when a run is tracked
/// and never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOptions {
    /// Delay before every query, including the first one.
    pub poll_interval: Duration,
    /// Deadline measured from loop creation.
    pub max_timeout: Duration,
}

impl TrackOptions {
    pub fn new(poll_interval: Duration, max_timeout: Duration) -> Self {
        Self {
            poll_interval,
            max_timeout,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    pub fn with_poll_interval_secs(self, secs: u64) -> Self {
        self.with_poll_interval(Duration::from_secs(secs))
    }

    pub fn with_max_timeout_secs(self, secs: u64) -> Self {
        self.with_max_timeout(Duration::from_secs(secs))
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.poll_interval.is_zero() {
            return Err(ModelError::InvalidOptions(
                "poll interval must be positive".into(),
            ));
        }
        if self.max_timeout.is_zero() {
            return Err(ModelError::InvalidOptions(
                "max timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_timeout: Duration::from_secs(DEFAULT_MAX_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_two_and_one_twenty_seconds() {
        let opts = TrackOptions::default();
        assert_eq!(opts.poll_interval, Duration::from_secs(2));
        assert_eq!(opts.max_timeout, Duration::from_secs(120));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let opts = TrackOptions::default().with_poll_interval_secs(0);
        assert!(matches!(opts.validate(), Err(ModelError::InvalidOptions(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let opts = TrackOptions::default().with_max_timeout(Duration::ZERO);
        assert!(matches!(opts.validate(), Err(ModelError::InvalidOptions(_))));
    }

    #[test]
    fn sub_second_interval_is_allowed() {
        let opts = TrackOptions::default().with_poll_interval(Duration::from_millis(250));
        assert!(opts.validate().is_ok());
    }
}
