//! Heartbeat: a ping/pong pair under two independent admission-control layers.
//!
//! The ping side fires a probe on a fixed period, gated by a rate limiter whose state
//! is shared by every ping process on the host through a locked file. The pong side
//! answers the probe under its own in-process limiter and stores the audit records
//! relayed by every ping process.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod ratelimit;
pub mod resilience;
pub mod sink;
pub mod store;

pub use config::{PingConfig, PongConfig};
pub use http::PongServer;
pub use lifecycle::Shutdown;
pub use probe::{Pinger, Scheduler};
pub use ratelimit::{AdmissionController, LocalAdmissionController, RemoteAdmissionController};
