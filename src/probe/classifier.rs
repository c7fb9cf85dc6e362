//! Outcome classification.
//!
//! | Outcome            | Kind            | Status          | Message             |
//! |--------------------|-----------------|-----------------|---------------------|
//! | local denial       | LocallyDenied   | 429             | fixed description   |
//! | remote 2xx         | Success         | remote status   | response body       |
//! | remote 4xx         | RemotelyDenied  | 429             | fixed description   |
//! | anything else      | TransportError  | 429             | error detail        |

use crate::probe::client::{TransportError, TransportResponse};
use crate::probe::types::{
    local_timestamp, AuditRecord, ProbeAttempt, ProbeResult, LOCALLY_DENIED_MESSAGE,
    NORMALIZED_DENIED_STATUS, REMOTELY_DENIED_MESSAGE,
};

/// What happened to an attempt before classification.
#[derive(Debug)]
pub enum ProbeOutcome {
    LocallyDenied,
    Response(TransportResponse),
    Failed(TransportError),
}

/// A classified attempt and the record that must be emitted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub result: ProbeResult,
    pub record: AuditRecord,
}

/// Map an outcome to exactly one result and one audit record.
pub fn classify(attempt: &ProbeAttempt, outcome: ProbeOutcome) -> Classified {
    let result = match outcome {
        ProbeOutcome::LocallyDenied => ProbeResult::LocallyDenied,
        ProbeOutcome::Response(resp) if (200..300).contains(&resp.status) => ProbeResult::Success {
            status: resp.status,
            body: resp.body,
        },
        ProbeOutcome::Response(resp) if (400..500).contains(&resp.status) => {
            ProbeResult::RemotelyDenied { body: resp.body }
        }
        ProbeOutcome::Response(resp) => ProbeResult::TransportError {
            detail: format!("unexpected status {} from pong service", resp.status),
        },
        ProbeOutcome::Failed(e) => ProbeResult::TransportError {
            detail: e.to_string(),
        },
    };

    let (status, message) = match &result {
        ProbeResult::Success { status, body } => (*status, body.clone()),
        ProbeResult::LocallyDenied => (NORMALIZED_DENIED_STATUS, LOCALLY_DENIED_MESSAGE.to_string()),
        ProbeResult::RemotelyDenied { .. } => {
            (NORMALIZED_DENIED_STATUS, REMOTELY_DENIED_MESSAGE.to_string())
        }
        ProbeResult::TransportError { detail } => (NORMALIZED_DENIED_STATUS, detail.clone()),
    };

    let record = AuditRecord {
        id: None,
        request_id: attempt.request_id.clone(),
        message,
        status,
        timestamp: local_timestamp(),
        result_kind: result.kind(),
    };

    Classified { result, record }
}
