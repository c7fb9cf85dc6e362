//! Fixed-window request counter.

use std::time::Duration;
use thiserror::Error;

/// Size of the persisted state: two big-endian `i64`s.
pub const STATE_LEN: usize = 16;

/// Rejected limiter parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimiterConfigError {
    #[error("rate limit must be at least 1")]
    ZeroRateLimit,
    #[error("window duration must be positive")]
    EmptyWindow,
}

/// Limit and window length for one limiter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    rate_limit: u32,
    window: Duration,
}

impl RateLimiterConfig {
    pub fn new(rate_limit: u32, window: Duration) -> Result<Self, LimiterConfigError> {
        if rate_limit == 0 {
            return Err(LimiterConfigError::ZeroRateLimit);
        }
        if window.as_millis() == 0 {
            return Err(LimiterConfigError::EmptyWindow);
        }
        Ok(Self { rate_limit, window })
    }

    pub fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn window_millis(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Counter state for the current window.
///
/// `count` is the number of admitted requests since `window_start_epoch_millis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowState {
    pub window_start_epoch_millis: i64,
    pub count: i64,
}

impl WindowState {
    /// A fresh window opened at `now`.
    pub fn fresh(now: i64) -> Self {
        Self {
            window_start_epoch_millis: now,
            count: 0,
        }
    }

    /// Encode as the 16-byte big-endian file layout.
    pub fn encode(&self) -> [u8; STATE_LEN] {
        let mut buf = [0u8; STATE_LEN];
        buf[..8].copy_from_slice(&self.window_start_epoch_millis.to_be_bytes());
        buf[8..].copy_from_slice(&self.count.to_be_bytes());
        buf
    }

    /// Decode the file layout.
    ///
    /// Returns `None` for short input or values no writer could have produced
    /// (negative start or count). Callers treat `None` as "absent".
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < STATE_LEN {
            return None;
        }
        let start = i64::from_be_bytes(bytes[..8].try_into().ok()?);
        let count = i64::from_be_bytes(bytes[8..STATE_LEN].try_into().ok()?);
        if start < 0 || count < 0 {
            return None;
        }
        Some(Self {
            window_start_epoch_millis: start,
            count,
        })
    }
}

/// Strict fixed-window admission.
///
/// Bursts of up to `rate_limit` on each side of a window boundary are expected
/// behavior: this is neither a sliding window nor a token bucket.
pub struct WindowCounter;

impl WindowCounter {
    /// Apply one admission attempt at `now`.
    ///
    /// A window that is exactly `window` old is reset before the limit check.
    pub fn admit(state: WindowState, now: i64, config: &RateLimiterConfig) -> (WindowState, bool) {
        let mut next = state;
        if now.saturating_sub(state.window_start_epoch_millis) >= config.window_millis() {
            next = WindowState::fresh(now);
        }

        if next.count < i64::from(config.rate_limit) {
            next.count += 1;
            (next, true)
        } else {
            (next, false)
        }
    }

    /// Milliseconds until the window containing `state` closes, as seen at `now`.
    pub fn remaining_millis(state: &WindowState, now: i64, config: &RateLimiterConfig) -> i64 {
        let elapsed = now.saturating_sub(state.window_start_epoch_millis);
        (config.window_millis() - elapsed).max(0)
    }
}
