//! Retry policy: attempt budget and exponential backoff schedule.
//!
//! [`RetryPolicy`] wraps a fallible call explicitly: callers ask
//! [`RetryPolicy::allows_retry`] after a failed attempt and sleep for
//! [`RetryPolicy::delay_after`] before the next one.

use std::time::Duration;

/// Bounded retry with exponential backoff.
///
/// The wait before attempt `n + 1` is `multiplier * 2^(n - 1)`, clamped to
/// `[min_delay, max_delay]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, multiplier: Duration, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier,
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// Completion calls: 2 attempts, waits between 2s and 6s.
    pub fn completion_default() -> Self {
        Self::new(
            2,
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(6),
        )
    }

    /// Storage writes: 3 attempts, waits between 4s and 10s.
    pub fn storage_default() -> Self {
        Self::new(
            3,
            Duration::from_secs(1),
            Duration::from_secs(4),
            Duration::from_secs(10),
        )
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    /// `max_attempts` attempts with no waiting in between.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    /// Whether another attempt may follow `attempt` (1-based).
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let raw = self.multiplier.saturating_mul(1u32 << exponent);
        raw.clamp(self.min_delay, self.max_delay)
    }

    // ==================== Builder Methods ====================

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::completion_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_schedule_is_clamped() {
        let policy = RetryPolicy::completion_default();
        // 1s raw, raised to the 2s floor
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(6));
        assert_eq!(policy.delay_after(40), Duration::from_secs(6));
    }

    #[test]
    fn test_storage_schedule() {
        let policy = RetryPolicy::storage_default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(8));
        assert_eq!(policy.delay_after(5), Duration::from_secs(10));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::immediate(3);
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
        assert!(!RetryPolicy::no_retry().allows_retry(1));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_inverted_bounds_do_not_panic() {
        let policy = RetryPolicy::new(
            2,
            Duration::from_secs(1),
            Duration::from_secs(5),
            Duration::from_secs(1),
        );
        assert_eq!(policy.delay_after(1), Duration::from_secs(5));
    }
}
