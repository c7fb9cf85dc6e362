//! Pong endpoint handlers.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::http::server::AppState;
use crate::probe::client::X_REQUEST_ID;
use crate::probe::types::AuditRecord;
use crate::ratelimit::AdmissionController;
use crate::store::{Consumed, StoreError};

/// Body of an admitted probe.
pub const PONG_BODY: &str = "World";
/// Body of a probe denied by the pong limiter.
pub const PONG_DENIED_BODY: &str = "Rate limited by Pong service";

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub records: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestAck {
    pub id: i64,
    pub request_id: String,
    pub duplicate: bool,
}

/// `GET /api/pong`.
///
/// Always answers 200 or 429; denial is not an error.
pub async fn pong(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let caller_request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(request_id = %request_id, caller_request_id = %caller_request_id, "Processing ping request");

    if state.limiter.try_acquire() {
        tracing::info!(
            target: "audit",
            request_id = %request_id,
            caller_request_id = %caller_request_id,
            "Request processed successfully"
        );
        (StatusCode::OK, PONG_BODY).into_response()
    } else {
        let retry_after = state.limiter.retry_after().as_millis().div_ceil(1000).max(1);
        tracing::info!(
            target: "rate_limit",
            request_id = %request_id,
            caller_request_id = %caller_request_id,
            "Request rate limited"
        );
        (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
            PONG_DENIED_BODY,
        )
            .into_response()
    }
}

/// `POST /api/records`: consume one relayed audit record.
///
/// 201 for a new record, 200 for a redelivery, 503 when it could not be persisted
/// (the relay retries).
pub async fn ingest_record(State(state): State<AppState>, Json(record): Json<AuditRecord>) -> Response {
    let request_id = record.request_id.clone();
    let store = state.store.clone();
    let consumed = match tokio::task::spawn_blocking(move || store.consume(record)).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Record consumer aborted");
            return (StatusCode::SERVICE_UNAVAILABLE, "record consumer aborted").into_response();
        }
    };

    match consumed {
        Ok(consumed) => {
            let duplicate = matches!(consumed, Consumed::Duplicate(_));
            tracing::info!(request_id = %request_id, id = consumed.id(), duplicate, "Record consumed");
            let status = if duplicate { StatusCode::OK } else { StatusCode::CREATED };
            let ack = IngestAck {
                id: consumed.id(),
                request_id,
                duplicate,
            };
            (status, Json(ack)).into_response()
        }
        Err(StoreError::MissingRequestId) => {
            (StatusCode::BAD_REQUEST, "record has an empty request id").into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to store record");
            (StatusCode::SERVICE_UNAVAILABLE, "record could not be stored").into_response()
        }
    }
}

/// `GET /api/records`: stored records ordered by id.
pub async fn list_records(State(state): State<AppState>) -> Json<Vec<AuditRecord>> {
    Json(state.store.list())
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        records: state.store.len(),
    })
}
