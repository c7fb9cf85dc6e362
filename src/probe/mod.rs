//! Caller-side probe subsystem.
//!
//! # Data Flow
//! ```text
//! orchestrator.rs (timer tick)
//!     → ratelimit::LocalAdmissionController (shared state file)
//!         denied  → classifier.rs (LocallyDenied)
//!         granted → client.rs (GET /api/pong, bounded by timeout)
//!                 → classifier.rs (Success / RemotelyDenied / TransportError)
//!     → sink::AuditSink::publish (one record per attempt)
//! ```
//!
//! # Design Decisions
//! - Classification is pure; emission happens in exactly one place
//! - Transport failures never leave the orchestrator as errors
//! - Remote denial and transport failure are distinct kinds

pub mod classifier;
pub mod client;
pub mod orchestrator;
pub mod types;

pub use classifier::{classify, Classified, ProbeOutcome};
pub use client::{HttpProbeClient, ProbeTransport, TransportError, TransportResponse, X_REQUEST_ID};
pub use orchestrator::{Pinger, PublishFailed, Scheduler, SchedulerStats, MAX_IN_FLIGHT};
pub use types::{AuditRecord, ProbeAttempt, ProbeResult, ResultKind};
