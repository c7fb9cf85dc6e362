//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Probe to pong:
//!     → probe/client.rs (one deadline around the whole exchange, no retry)
//!
//! Record relay to pong:
//!     → backoff.rs (bounded attempts, exponential delay with jitter)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - Probes are never retried within a tick; the next tick is the retry
//! - Record publishing retries, since losing a record breaks the audit trail

pub mod backoff;
