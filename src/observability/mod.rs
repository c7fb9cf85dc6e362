//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events; `audit` and `rate_limit` targets)
//!     → metrics.rs (admission decisions, probe results, sink failures)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request id is a field on every probe-related event
//! - Metric updates are cheap and safe to call before the exporter is installed

pub mod logging;
pub mod metrics;
