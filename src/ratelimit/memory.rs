//! In-process admission control for the callee.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::observability::metrics;
use crate::ratelimit::clock::{Clock, SystemClock};
use crate::ratelimit::window::{RateLimiterConfig, WindowCounter, WindowState};
use crate::ratelimit::AdmissionController;

/// Fixed-window limiter whose state lives in process memory.
///
/// Only one process answers the probe endpoint, so a mutex is enough. Replicas do
/// not share this state.
pub struct RemoteAdmissionController {
    state: Mutex<Option<WindowState>>,
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
}

impl RemoteAdmissionController {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(None),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Time until the current window closes; zero when no window is open.
    pub fn retry_after(&self) -> Duration {
        let now = self.clock.now_millis();
        let Ok(state) = self.state.lock() else {
            return self.config.window();
        };
        match state.as_ref() {
            Some(s) => Duration::from_millis(WindowCounter::remaining_millis(s, now, &self.config) as u64),
            None => Duration::ZERO,
        }
    }
}

impl AdmissionController for RemoteAdmissionController {
    fn try_acquire(&self) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::error!("Remote limiter mutex poisoned, denying");
                metrics::record_admission("remote", false);
                return false;
            }
        };

        let now = self.clock.now_millis();
        let current = state.unwrap_or_else(|| WindowState::fresh(now));
        let (next, admitted) = WindowCounter::admit(current, now, &self.config);
        *state = Some(next);
        drop(state);

        metrics::record_admission("remote", admitted);
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::clock::ManualClock;
    use std::thread;

    fn limiter(limit: u32, clock: &ManualClock) -> RemoteAdmissionController {
        RemoteAdmissionController::with_clock(
            RateLimiterConfig::new(limit, Duration::from_secs(1)).unwrap(),
            Arc::new(clock.clone()),
        )
    }

    #[test]
    fn test_one_per_second() {
        let clock = ManualClock::new(0);
        let limiter = limiter(1, &clock);

        assert!(limiter.try_acquire());
        clock.advance(Duration::from_millis(999));
        assert!(!limiter.try_acquire());
        clock.advance(Duration::from_millis(1));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_retry_after_counts_down() {
        let clock = ManualClock::new(0);
        let limiter = limiter(1, &clock);
        assert_eq!(limiter.retry_after(), Duration::ZERO);

        assert!(limiter.try_acquire());
        clock.advance(Duration::from_millis(300));
        assert_eq!(limiter.retry_after(), Duration::from_millis(700));
    }

    #[test]
    fn test_concurrent_callers_respect_limit() {
        let clock = ManualClock::new(0);
        let limiter = Arc::new(limiter(10, &clock));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                thread::spawn(move || limiter.try_acquire())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 10);
    }
}
