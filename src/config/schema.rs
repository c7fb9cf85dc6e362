//! Configuration schema definitions.
//!
//! This module defines the configuration structure for both services.
//! All types derive Serde traits for deserialization from config files, and every
//! field has a default so an empty file is a valid config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ratelimit::window::{LimiterConfigError, RateLimiterConfig};
use crate::resilience::backoff::RetryPolicy;

/// Root configuration for the ping (caller) service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PingConfig {
    /// Probe target and timing.
    pub probe: ProbeConfig,

    /// Host-wide rate limit shared by every ping process.
    pub rate_limit: LocalRateLimitConfig,

    /// Where audit records go.
    pub sink: SinkConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Root configuration for the pong (callee) service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PongConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// In-process rate limit for `/api/pong`.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Record ingest and storage.
    pub records: RecordsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Base URL of the pong service.
    pub pong_url: String,

    /// Path of the probe endpoint.
    pub path: String,

    /// Timer period in milliseconds.
    pub interval_ms: u64,

    /// Deadline for one probe exchange in milliseconds.
    pub timeout_ms: u64,

    /// Attempts allowed to run at once. 1 skips ticks while a probe is running.
    pub max_in_flight: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            pong_url: "http://127.0.0.1:8080".to_string(),
            path: "/api/pong".to_string(),
            interval_ms: 1000,
            timeout_ms: 3000,
            max_in_flight: 1,
        }
    }
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Fixed-window limit parameters.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per window.
    pub rate_limit: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate_limit: 1,
            window_ms: 1000,
        }
    }
}

impl RateLimitConfig {
    pub fn limiter(&self) -> Result<RateLimiterConfig, LimiterConfigError> {
        RateLimiterConfig::new(self.rate_limit, Duration::from_millis(self.window_ms))
    }
}

/// Host-wide limiter backed by a shared state file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalRateLimitConfig {
    /// Requests admitted per window across all ping processes.
    pub rate_limit: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// State file every ping process on the host must agree on.
    pub state_file: String,

    /// Longest wait for the state file lock before denying.
    pub lock_timeout_ms: u64,

    /// Delete the state file on shutdown. Disturbs sibling processes.
    pub cleanup_on_shutdown: bool,
}

impl Default for LocalRateLimitConfig {
    fn default() -> Self {
        Self {
            rate_limit: 2,
            window_ms: 1000,
            state_file: "ping-rate.data".to_string(),
            lock_timeout_ms: 500,
            cleanup_on_shutdown: false,
        }
    }
}

impl LocalRateLimitConfig {
    pub fn limiter(&self) -> Result<RateLimiterConfig, LimiterConfigError> {
        RateLimiterConfig::new(self.rate_limit, Duration::from_millis(self.window_ms))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// POST records to the pong service's ingest endpoint.
    Http {
        url: String,
        #[serde(default = "default_sink_attempts")]
        max_attempts: u32,
        #[serde(default = "default_sink_base_delay")]
        base_delay_ms: u64,
        #[serde(default = "default_sink_max_delay")]
        max_delay_ms: u64,
        #[serde(default = "default_sink_timeout")]
        timeout_ms: u64,
    },
    /// Append JSON lines to a local file.
    File { path: String },
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Http {
            url: "http://127.0.0.1:8080/api/records".to_string(),
            max_attempts: default_sink_attempts(),
            base_delay_ms: default_sink_base_delay(),
            max_delay_ms: default_sink_max_delay(),
            timeout_ms: default_sink_timeout(),
        }
    }
}

impl SinkConfig {
    /// Retry schedule for the HTTP relay; file appends are not retried.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            SinkConfig::Http {
                max_attempts,
                base_delay_ms,
                max_delay_ms,
                ..
            } => RetryPolicy {
                max_attempts: *max_attempts,
                base_delay_ms: *base_delay_ms,
                max_delay_ms: *max_delay_ms,
            },
            SinkConfig::File { .. } => RetryPolicy::once(),
        }
    }
}

fn default_sink_attempts() -> u32 {
    3
}

fn default_sink_base_delay() -> u64 {
    100
}

fn default_sink_max_delay() -> u64 {
    1000
}

fn default_sink_timeout() -> u64 {
    5000
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Record ingest configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// JSON-lines log; records are kept in memory only when unset.
    pub path: Option<String>,

    /// Largest accepted record body in bytes.
    pub max_body_bytes: usize,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            path: Some("pong-records.jsonl".to_string()),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON instead of human-readable lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let ping: PingConfig = toml::from_str("").unwrap();
        assert_eq!(ping.rate_limit.rate_limit, 2);
        assert_eq!(ping.rate_limit.window_ms, 1000);
        assert_eq!(ping.rate_limit.state_file, "ping-rate.data");
        assert_eq!(ping.probe.interval(), Duration::from_secs(1));
        assert!(matches!(ping.sink, SinkConfig::Http { .. }));

        let pong: PongConfig = toml::from_str("").unwrap();
        assert_eq!(pong.rate_limit, RateLimitConfig { rate_limit: 1, window_ms: 1000 });
        assert_eq!(pong.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_file_sink_is_tagged() {
        let ping: PingConfig = toml::from_str(
            r#"
            [probe]
            pong_url = "http://pong:8080"
            interval_ms = 250

            [sink]
            type = "file"
            path = "/var/log/ping.jsonl"
            "#,
        )
        .unwrap();

        assert_eq!(ping.probe.pong_url, "http://pong:8080");
        assert_eq!(ping.probe.path, "/api/pong");
        assert_eq!(ping.sink, SinkConfig::File { path: "/var/log/ping.jsonl".into() });
        assert_eq!(ping.sink.retry_policy(), RetryPolicy::once());
    }

    #[test]
    fn test_http_sink_fills_retry_defaults() {
        let ping: PingConfig = toml::from_str(
            r#"
            [sink]
            type = "http"
            url = "http://pong:8080/api/records"
            max_attempts = 5
            "#,
        )
        .unwrap();

        let policy = ping.sink.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay_ms, 100);
    }
}
