//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Bounded retry schedule for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delay before the attempt following attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        }
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000 && max.as_millis() < 1100);
    }

    #[test]
    fn test_policy_once_has_no_delay() {
        let policy = RetryPolicy::once();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay_for(1), Duration::ZERO);
    }
}
