//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level so a single process can be turned up
//! without editing its config file.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

fn default_directives(level: &str) -> String {
    format!("heartbeat={level},ping={level},pong={level},audit=info,rate_limit=info,tower_http=info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_parse() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("heartbeat=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }

    #[test]
    fn test_double_init_is_harmless() {
        let config = ObservabilityConfig::default();
        init_logging(&config);
        init_logging(&config);
    }
}
