//! Probe attempts, results and the audit record derived from them.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message recorded when the caller's own limiter denies a tick.
pub const LOCALLY_DENIED_MESSAGE: &str = "Rate limited by Ping service";
/// Message recorded when the callee answers with a 4xx.
pub const REMOTELY_DENIED_MESSAGE: &str = "Rate limited by Pong service";
/// Status recorded for every non-success outcome.
pub const NORMALIZED_DENIED_STATUS: u16 = 429;

/// Local wall-clock time as stored in audit records.
pub fn local_timestamp() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// One tick's probe, identified by its correlation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub request_id: String,
    pub issued_at: NaiveDateTime,
}

impl ProbeAttempt {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            issued_at: local_timestamp(),
        }
    }
}

impl Default for ProbeAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Classified outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Success { status: u16, body: String },
    LocallyDenied,
    RemotelyDenied { body: String },
    TransportError { detail: String },
}

impl ProbeResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            ProbeResult::Success { .. } => ResultKind::Success,
            ProbeResult::LocallyDenied => ResultKind::LocallyDenied,
            ProbeResult::RemotelyDenied { .. } => ResultKind::RemotelyDenied,
            ProbeResult::TransportError { .. } => ResultKind::TransportError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultKind {
    Success,
    LocallyDenied,
    RemotelyDenied,
    TransportError,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Success => "SUCCESS",
            ResultKind::LocallyDenied => "LOCALLY_DENIED",
            ResultKind::RemotelyDenied => "REMOTELY_DENIED",
            ResultKind::TransportError => "TRANSPORT_ERROR",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The durable unit handed to the audit sink.
///
/// `id` is absent on the caller side and assigned by the callee's store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub request_id: String,
    pub message: String,
    pub status: u16,
    pub timestamp: NaiveDateTime,
    pub result_kind: ResultKind,
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[RequestId: {}, Kind: {}, Status: {}, Message: {}, Time: {}]",
            self.request_id,
            self.result_kind,
            self.status,
            self.message,
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        )
    }
}
