//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use heartbeat::config::PongConfig;
use heartbeat::probe::AuditRecord;
use heartbeat::ratelimit::{RateLimiterConfig, RemoteAdmissionController};
use heartbeat::sink::{AuditSink, SinkError};
use heartbeat::store::RecordStore;
use heartbeat::PongServer;

/// A running pong service on an ephemeral port.
#[allow(dead_code)]
pub struct TestPong {
    pub addr: SocketAddr,
    pub store: Arc<RecordStore>,
    pub shutdown: broadcast::Sender<()>,
}

#[allow(dead_code)]
impl TestPong {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start a pong service admitting `rate_limit` requests per `window`.
#[allow(dead_code)]
pub async fn start_pong(rate_limit: u32, window: Duration) -> TestPong {
    let limiter = Arc::new(RemoteAdmissionController::new(
        RateLimiterConfig::new(rate_limit, window).unwrap(),
    ));
    let store = Arc::new(RecordStore::in_memory());
    let mut config = PongConfig::default();
    config.records.path = None;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, rx) = broadcast::channel(1);
    let server = PongServer::new(config, limiter, store.clone());
    tokio::spawn(server.run(listener, rx));

    TestPong {
        addr,
        store,
        shutdown,
    }
}

/// Start a programmable mock backend; `f` decides each response.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request(&mut socket).await;
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

// Drain headers and a Content-Length body so closing never resets the client.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else { return };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return;
        }
    }
}

/// Address with nothing listening on it.
#[allow(dead_code)]
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Sink that keeps records in memory.
#[derive(Default)]
#[allow(dead_code)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

#[allow(dead_code)]
impl MemorySink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn publish(&self, record: &AuditRecord) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
