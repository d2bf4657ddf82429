//! Bounded retry with exponential backoff for conditional-write conflicts.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total read-increment-write cycles before giving up (>= 1).
    pub max_attempts: u32,
    /// Sleep after the first conflict; doubles on each further conflict.
    pub base_delay: Duration,
    /// Upper bound for a single sleep.
    pub max_delay: Duration,
    /// Budget for the whole operation, store calls and sleeps included.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
            deadline: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `attempt`-th conflict (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << shift;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}
