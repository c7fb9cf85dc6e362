//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::validation::{Validate, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config<T>(path: &Path) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate,
{
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config<T>(content: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate,
{
    let config: T = toml::from_str(content)?;
    config.validate().map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load from `path` when given, otherwise use defaults.
pub fn load_or_default<T>(path: Option<&Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Validate + Default,
{
    match path {
        Some(path) => load_config(path),
        None => {
            let config = T::default();
            config.validate().map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{PingConfig, PongConfig};

    #[test]
    fn test_validation_errors_are_joined() {
        let err = parse_config::<PongConfig>(
            r#"
            [rate_limit]
            rate_limit = 0
            window_ms = 0
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("rate_limit must be at least 1, rate_limit: window_ms must be positive"));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_config::<PingConfig>("[probe\ninterval_ms = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config::<PingConfig>(Path::new("/nonexistent/ping.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_defaults_without_path() {
        let config: PingConfig = load_or_default(None).unwrap();
        assert_eq!(config.rate_limit.rate_limit, 2);
    }
}
