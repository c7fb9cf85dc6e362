//! Probe transport.
//!
//! # Responsibilities
//! - Issue the GET against the pong endpoint
//! - Bound the whole exchange (connect, headers, body) by one deadline
//! - Report failures as values, never as panics
//!
//! # Design Decisions
//! - Timeouts use Tokio's facilities around the full exchange
//! - The caller's request id travels in `x-request-id`
//! - No retries here; a failed probe is classified and recorded

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time;
use url::Url;

/// Header carrying the caller's correlation key.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Status line and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("pong service timed out after {0:?}")]
    Timeout(Duration),

    #[error("pong service unreachable: {0}")]
    Unreachable(String),

    #[error("failed to read pong response body: {0}")]
    Body(String),
}

/// "Send GET, receive status and body, may fail."
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn get(&self, request_id: &str) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport used in production.
pub struct HttpProbeClient {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl HttpProbeClient {
    pub fn new(base_url: &Url, path: &str, timeout: Duration) -> Result<Self, url::ParseError> {
        let url = base_url.join(path)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("heartbeat-ping/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Ok(Self { client, url, timeout })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ProbeTransport for HttpProbeClient {
    async fn get(&self, request_id: &str) -> Result<TransportResponse, TransportError> {
        let exchange = async {
            let response = self
                .client
                .get(self.url.clone())
                .header(X_REQUEST_ID, request_id)
                .send()
                .await
                .map_err(|e| TransportError::Unreachable(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;
            Ok(TransportResponse { status, body })
        };

        match time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_path() {
        let base = Url::parse("http://127.0.0.1:8080").unwrap();
        let client = HttpProbeClient::new(&base, "/api/pong", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url().as_str(), "http://127.0.0.1:8080/api/pong");
    }

    #[tokio::test]
    async fn test_unreachable_is_an_error_value() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("http://{}", addr)).unwrap();
        let client = HttpProbeClient::new(&base, "/api/pong", Duration::from_secs(2)).unwrap();
        let err = client.get("id").await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the socket without answering.
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let base = Url::parse(&format!("http://{}", addr)).unwrap();
        let client = HttpProbeClient::new(&base, "/api/pong", Duration::from_millis(100)).unwrap();
        let err = client.get("id").await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }
}
