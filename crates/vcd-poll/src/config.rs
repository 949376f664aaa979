use std::time::Duration;

use crate::error::PollConfigError;

/// Longest a single wait may take unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Delay between two reads of the watched entity.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Timeout and interval of a poll loop. Both are always finite and non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    timeout: Duration,
    interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl PollConfig {
    /// # Errors
    ///
    /// Returns an error if either duration is zero.
    pub fn new(timeout: Duration, interval: Duration) -> Result<Self, PollConfigError> {
        if timeout.is_zero() {
            return Err(PollConfigError::ZeroTimeout);
        }
        if interval.is_zero() {
            return Err(PollConfigError::ZeroInterval);
        }
        Ok(Self { timeout, interval })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_documented_durations() {
        let config = PollConfig::default();

        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.interval(), DEFAULT_INTERVAL);
    }

    #[test]
    fn new_accepts_positive_durations() -> anyhow::Result<()> {
        let config = PollConfig::new(Duration::from_secs(30), Duration::from_millis(250))?;

        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.interval(), Duration::from_millis(250));
        Ok(())
    }

    #[test]
    fn new_rejects_zero_timeout() {
        let result = PollConfig::new(Duration::ZERO, Duration::from_secs(1));

        assert!(matches!(result, Err(PollConfigError::ZeroTimeout)));
    }

    #[test]
    fn new_rejects_zero_interval() {
        let result = PollConfig::new(Duration::from_secs(1), Duration::ZERO);

        assert!(matches!(result, Err(PollConfigError::ZeroInterval)));
    }
}
