//! Audit record sinks.
//!
//! # Data Flow
//! ```text
//! Orchestrator tick
//!     → classifier builds AuditRecord
//!     → AuditSink::publish (ack or error)
//!         → http.rs: POST to the pong service's record ingest (retried with backoff)
//!         → file.rs: append one JSON line, fsync
//! ```
//!
//! # Design Decisions
//! - Delivery is at-least-once; consumers deduplicate by request id
//! - A publish error is returned to the tick that produced the record,
//!   never to the scheduler loop

pub mod file;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::probe::types::AuditRecord;

pub use file::FileSink;
pub use http::HttpRelaySink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("record relay rejected {request_id} with status {status}")]
    Rejected { request_id: String, status: u16 },

    #[error("record relay unreachable after {attempts} attempt(s): {detail}")]
    Unreachable { attempts: u32, detail: String },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to persist record: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Hand one record off. `Ok` means the sink acknowledged it.
    async fn publish(&self, record: &AuditRecord) -> Result<(), SinkError>;
}
