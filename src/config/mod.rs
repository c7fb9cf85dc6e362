//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PingConfig / PongConfig (validated, immutable)
//!     → plain values handed to the limiter, probe client, sink and server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a limiter keeps its limit for its lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, LocalRateLimitConfig, ObservabilityConfig, PingConfig, PongConfig,
    ProbeConfig, RateLimitConfig, RecordsConfig, SinkConfig, TimeoutConfig,
};
pub use validation::{Validate, ValidationError};
