//! Relay records to the pong service's ingest endpoint.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::probe::types::AuditRecord;
use crate::resilience::backoff::RetryPolicy;
use crate::sink::{AuditSink, SinkError};

/// POSTs each record as JSON; retries connection failures and 5xx with backoff.
///
/// A retried POST may land twice. The consumer keys records by request id, so a
/// duplicate is acknowledged without being stored again.
pub struct HttpRelaySink {
    client: reqwest::Client,
    url: Url,
    retry: RetryPolicy,
}

impl HttpRelaySink {
    pub fn new(url: Url, retry: RetryPolicy, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { client, url, retry }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl AuditSink for HttpRelaySink {
    async fn publish(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let detail = match self.client.post(self.url.clone()).json(record).send().await {
                Ok(res) if res.status().is_success() => {
                    tracing::debug!(
                        request_id = %record.request_id,
                        status = %res.status(),
                        attempt,
                        "Record relayed"
                    );
                    return Ok(());
                }
                Ok(res) if res.status().is_client_error() => {
                    return Err(SinkError::Rejected {
                        request_id: record.request_id.clone(),
                        status: res.status().as_u16(),
                    });
                }
                Ok(res) => format!("status {}", res.status().as_u16()),
                Err(e) => e.to_string(),
            };

            if attempt >= self.retry.max_attempts {
                return Err(SinkError::Unreachable {
                    attempts: attempt,
                    detail,
                });
            }

            let delay = self.retry.delay_for(attempt);
            tracing::warn!(
                request_id = %record.request_id,
                attempt,
                delay = ?delay,
                error = %detail,
                "Record relay failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

