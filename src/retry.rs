//! Bounded retry with linear backoff.

use std::time::Duration;

use crate::config::EnrichConfig;

/// How many times a unit of work may be attempted and how long to wait
/// between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay multiplied by the retry number after a rate limit.
    pub base_delay: Duration,
    /// Flat pause after a connection error.
    pub connection_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with explicit values.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, connection_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            connection_delay,
        }
    }

    /// Build the policy used for detail batches.
    #[must_use]
    pub fn from_config(config: &EnrichConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
            Duration::from_millis(config.connection_error_delay_ms),
        )
    }

    /// Wait before retry number `retry` (1-based) after a rate limit.
    #[must_use]
    pub fn rate_limit_delay(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }

    /// Whether another attempt is allowed after `attempts_made`.
    #[must_use]
    pub fn can_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(policy.rate_limit_delay(1), Duration::from_secs(5));
        assert_eq!(policy.rate_limit_delay(2), Duration::from_secs(10));
        assert_eq!(policy.rate_limit_delay(3), Duration::from_secs(15));
    }

    #[test]
    fn test_delays_strictly_increase() {
        let policy = RetryPolicy::new(5, Duration::from_millis(7), Duration::ZERO);
        let delays: Vec<_> = (1..5).map(|n| policy.rate_limit_delay(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_attempts_are_bounded() {
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
        assert!(policy.can_retry(1));
        assert!(policy.can_retry(2));
        assert!(!policy.can_retry(3));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
    }
}
