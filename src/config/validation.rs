//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits ≥ 1, windows and intervals > 0)
//! - Check that URLs and socket addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function of the config value
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ObservabilityConfig, PingConfig, PongConfig, SinkConfig};
use crate::probe::orchestrator::MAX_IN_FLIGHT;

/// One semantic problem in a config file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Semantic checks run after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

impl Validate for PingConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        check_url(&mut errors, "probe.pong_url", &self.probe.pong_url);
        if !self.probe.path.starts_with('/') {
            errors.push(ValidationError::new("probe.path", "must start with '/'"));
        }
        check_positive(&mut errors, "probe.interval_ms", self.probe.interval_ms);
        check_positive(&mut errors, "probe.timeout_ms", self.probe.timeout_ms);
        if self.probe.max_in_flight == 0 {
            errors.push(ValidationError::new("probe.max_in_flight", "must be at least 1"));
        } else if self.probe.max_in_flight > MAX_IN_FLIGHT {
            errors.push(ValidationError::new(
                "probe.max_in_flight",
                format!("must be at most {}", MAX_IN_FLIGHT),
            ));
        }

        check_limit(&mut errors, "rate_limit", self.rate_limit.rate_limit, self.rate_limit.window_ms);
        if self.rate_limit.state_file.trim().is_empty() {
            errors.push(ValidationError::new("rate_limit.state_file", "must not be empty"));
        }

        match &self.sink {
            SinkConfig::Http { url, max_attempts, .. } => {
                check_url(&mut errors, "sink.url", url);
                if *max_attempts == 0 {
                    errors.push(ValidationError::new("sink.max_attempts", "must be at least 1"));
                }
            }
            SinkConfig::File { path } => {
                if path.trim().is_empty() {
                    errors.push(ValidationError::new("sink.path", "must not be empty"));
                }
            }
        }

        check_observability(&mut errors, &self.observability);
        into_result(errors)
    }
}

impl Validate for PongConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        check_addr(&mut errors, "listener.bind_address", &self.listener.bind_address);
        check_limit(&mut errors, "rate_limit", self.rate_limit.rate_limit, self.rate_limit.window_ms);
        check_positive(&mut errors, "timeouts.request_secs", self.timeouts.request_secs);
        if self.records.max_body_bytes == 0 {
            errors.push(ValidationError::new("records.max_body_bytes", "must be positive"));
        }

        check_observability(&mut errors, &self.observability);
        into_result(errors)
    }
}

fn check_limit(errors: &mut Vec<ValidationError>, field: &'static str, limit: u32, window_ms: u64) {
    if limit == 0 {
        errors.push(ValidationError::new(field, "rate_limit must be at least 1"));
    }
    if window_ms == 0 {
        errors.push(ValidationError::new(field, "window_ms must be positive"));
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::new(field, "must be positive"));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address '{}'", value)));
    }
}

fn check_observability(errors: &mut Vec<ValidationError>, config: &ObservabilityConfig) {
    if config.metrics_enabled {
        check_addr(errors, "observability.metrics_address", &config.metrics_address);
    }
}

fn into_result(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PingConfig::default().validate().is_ok());
        assert!(PongConfig::default().validate().is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = PingConfig::default();
        config.probe.pong_url = "not a url".into();
        config.probe.interval_ms = 0;
        config.rate_limit.rate_limit = 0;
        config.rate_limit.window_ms = 0;

        let errors = config.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(fields.contains(&"probe.pong_url"));
        assert!(fields.contains(&"probe.interval_ms"));
        assert_eq!(fields.iter().filter(|f| **f == "rate_limit").count(), 2);
    }

    #[test]
    fn test_max_in_flight_is_bounded() {
        let mut config = PingConfig::default();
        config.probe.max_in_flight = MAX_IN_FLIGHT;
        assert!(config.validate().is_ok());

        for bad in [0, MAX_IN_FLIGHT + 1, usize::MAX] {
            config.probe.max_in_flight = bad;
            let errors = config.validate().unwrap_err();
            assert_eq!(errors.len(), 1, "{:?}", errors);
            assert_eq!(errors[0].field, "probe.max_in_flight");
        }
    }

    #[test]
    fn test_pong_rejects_bad_bind_address() {
        let mut config = PongConfig::default();
        config.listener.bind_address = "localhost".into();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "listener.bind_address");
    }

    #[test]
    fn test_sink_scheme_must_be_http() {
        let mut config = PingConfig::default();
        config.sink = SinkConfig::Http {
            url: "ftp://pong/records".into(),
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 1000,
            timeout_ms: 1000,
        };
        let errors = config.validate().unwrap_err();
        assert!(errors[0].message.contains("ftp"));
    }
}
