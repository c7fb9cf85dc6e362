//! Startup wiring.
//!
//! Turns validated configs into running components in dependency order:
//! limiter first, then transport and sink, then the driver or server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::{PingConfig, PongConfig, SinkConfig};
use crate::http::PongServer;
use crate::probe::{HttpProbeClient, Pinger, Scheduler};
use crate::ratelimit::window::LimiterConfigError;
use crate::ratelimit::{LocalAdmissionController, RemoteAdmissionController};
use crate::sink::{AuditSink, FileSink, HttpRelaySink};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid rate limit: {0}")]
    Limiter(#[from] LimiterConfigError),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("record store: {0}")]
    Store(#[from] StoreError),
}

/// Everything the ping process runs.
pub struct PingComponents {
    pub limiter: Arc<LocalAdmissionController>,
    pub pinger: Arc<Pinger>,
    pub scheduler: Scheduler,
}

pub fn build_ping(config: &PingConfig) -> Result<PingComponents, StartupError> {
    let limiter = Arc::new(LocalAdmissionController::new(
        PathBuf::from(&config.rate_limit.state_file),
        config.rate_limit.limiter()?,
        config.rate_limit.lock_timeout(),
    ));

    let base = Url::parse(&config.probe.pong_url)?;
    let transport = Arc::new(HttpProbeClient::new(&base, &config.probe.path, config.probe.timeout())?);
    let sink = build_sink(&config.sink)?;

    let pinger = Arc::new(Pinger::new(limiter.clone(), transport, sink));
    let scheduler = Scheduler::new(pinger.clone(), config.probe.interval(), config.probe.max_in_flight);

    Ok(PingComponents {
        limiter,
        pinger,
        scheduler,
    })
}

pub fn build_sink(config: &SinkConfig) -> Result<Arc<dyn AuditSink>, StartupError> {
    let sink: Arc<dyn AuditSink> = match config {
        SinkConfig::Http { url, timeout_ms, .. } => Arc::new(HttpRelaySink::new(
            Url::parse(url)?,
            config.retry_policy(),
            Duration::from_millis(*timeout_ms),
        )),
        SinkConfig::File { path } => Arc::new(FileSink::new(path)),
    };
    Ok(sink)
}

pub fn build_pong(config: &PongConfig) -> Result<PongServer, StartupError> {
    let limiter = Arc::new(RemoteAdmissionController::new(config.rate_limit.limiter()?));
    let store = match &config.records.path {
        Some(path) => RecordStore::open(path)?,
        None => RecordStore::in_memory(),
    };
    Ok(PongServer::new(config.clone(), limiter, Arc::new(store)))
}
