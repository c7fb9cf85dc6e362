//! Metrics collection and exposition.
//!
//! # Metrics
//! - `heartbeat_admission_total` (counter): decisions by `layer` (local/remote), `decision`
//! - `ping_results_total` (counter): classified probe results by `kind`
//! - `ping_probe_duration_seconds` (histogram): admission-to-classification latency
//! - `ping_sink_failures_total` (counter): records the sink did not acknowledge
//! - `ping_ticks_skipped_total` (counter): ticks dropped by the overlap policy
//! - `pong_records_consumed_total` (counter): ingested records by `outcome`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::probe::types::ResultKind;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admission(layer: &'static str, admitted: bool) {
    let decision = if admitted { "admitted" } else { "denied" };
    counter!("heartbeat_admission_total", "layer" => layer, "decision" => decision).increment(1);
}

pub fn record_probe_result(kind: ResultKind, started: Instant) {
    counter!("ping_results_total", "kind" => kind.as_str()).increment(1);
    histogram!("ping_probe_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_sink_failure() {
    counter!("ping_sink_failures_total").increment(1);
}

pub fn record_tick_skipped() {
    counter!("ping_ticks_skipped_total").increment(1);
}

pub fn record_consumed(duplicate: bool) {
    let outcome = if duplicate { "duplicate" } else { "stored" };
    counter!("pong_records_consumed_total", "outcome" => outcome).increment(1);
}
