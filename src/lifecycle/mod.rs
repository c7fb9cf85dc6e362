//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build limiter → Build transport/sink → Start driver or server
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop timer / stop accepting → Drain in-flight work → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - In-flight probes finish and publish their records before exit

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{build_ping, build_pong, build_sink, PingComponents, StartupError};
