//! Periodic probe driver.
//!
//! # Responsibilities
//! - Fire on a fixed period, independent of how long earlier probes take
//! - Per attempt: local admission → remote call → classification → record publish
//! - Keep the loop alive whatever a single tick does
//!
//! # Design Decisions
//! - Admission runs on the blocking pool; file locking never stalls the runtime
//! - Overlap is bounded by `max_in_flight`; a tick with no free slot is skipped
//! - A skipped tick makes no attempt, so it has no request id and no record

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{broadcast, Semaphore};
use tokio::time::{self, MissedTickBehavior};

use crate::observability::metrics;
use crate::probe::classifier::{classify, Classified, ProbeOutcome};
use crate::probe::client::ProbeTransport;
use crate::probe::types::ProbeAttempt;
use crate::ratelimit::AdmissionController;
use crate::sink::{AuditSink, SinkError};

/// Largest supported `max_in_flight`; the drain on shutdown takes every slot at once.
pub const MAX_IN_FLIGHT: usize = if Semaphore::MAX_PERMITS < u32::MAX as usize {
    Semaphore::MAX_PERMITS
} else {
    u32::MAX as usize
};

/// The attempt was classified but its record was not acknowledged by the sink.
#[derive(Debug, Error)]
#[error("audit record {request_id} was not published: {source}")]
pub struct PublishFailed {
    pub request_id: String,
    pub classified: Classified,
    #[source]
    pub source: SinkError,
}

/// Runs single probe attempts.
pub struct Pinger {
    admission: Arc<dyn AdmissionController>,
    transport: Arc<dyn ProbeTransport>,
    sink: Arc<dyn AuditSink>,
}

impl Pinger {
    pub fn new(
        admission: Arc<dyn AdmissionController>,
        transport: Arc<dyn ProbeTransport>,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            admission,
            transport,
            sink,
        }
    }

    /// One independent attempt with a fresh request id.
    ///
    /// Every path publishes exactly one record before returning. Transport failures
    /// are part of the classified result; only a sink failure yields `Err`.
    pub async fn send_ping(&self) -> Result<Classified, PublishFailed> {
        let started = Instant::now();
        let attempt = ProbeAttempt::new();
        tracing::info!(
            target: "audit",
            request_id = %attempt.request_id,
            "Try to send ping request to pong service"
        );

        let outcome = if self.admit().await {
            match self.transport.get(&attempt.request_id).await {
                Ok(response) => ProbeOutcome::Response(response),
                Err(e) => ProbeOutcome::Failed(e),
            }
        } else {
            ProbeOutcome::LocallyDenied
        };

        let classified = classify(&attempt, outcome);
        metrics::record_probe_result(classified.record.result_kind, started);
        tracing::info!(target: "audit", record = %classified.record, "Result");

        match self.sink.publish(&classified.record).await {
            Ok(()) => Ok(classified),
            Err(source) => {
                metrics::record_sink_failure();
                tracing::error!(
                    request_id = %attempt.request_id,
                    error = %source,
                    "Failed to publish audit record"
                );
                Err(PublishFailed {
                    request_id: attempt.request_id,
                    classified,
                    source,
                })
            }
        }
    }

    async fn admit(&self) -> bool {
        let admission = self.admission.clone();
        match tokio::task::spawn_blocking(move || admission.try_acquire()).await {
            Ok(admitted) => admitted,
            Err(e) => {
                tracing::error!(error = %e, "Admission check aborted, denying");
                false
            }
        }
    }
}

/// Counters reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub skipped: u64,
}

/// Fixed-period driver around a [`Pinger`].
pub struct Scheduler {
    pinger: Arc<Pinger>,
    interval: Duration,
    max_in_flight: usize,
}

impl Scheduler {
    /// `max_in_flight == 1` serializes attempts (skip-if-busy); larger values allow
    /// that many overlapping attempts, clamped to [`MAX_IN_FLIGHT`].
    pub fn new(pinger: Arc<Pinger>, interval: Duration, max_in_flight: usize) -> Self {
        Self {
            pinger,
            interval,
            max_in_flight: max_in_flight.clamp(1, MAX_IN_FLIGHT),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> SchedulerStats {
        tracing::info!(
            interval = ?self.interval,
            max_in_flight = self.max_in_flight,
            "Ping scheduler starting"
        );

        let slots = Arc::new(Semaphore::new(self.max_in_flight));
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats = SchedulerStats::default();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    stats.ticks += 1;
                    let Ok(permit) = slots.clone().try_acquire_owned() else {
                        stats.skipped += 1;
                        metrics::record_tick_skipped();
                        tracing::warn!(tick = stats.ticks, "Previous probes still running, skipping tick");
                        continue;
                    };

                    let pinger = self.pinger.clone();
                    tokio::spawn(async move {
                        // Already logged inside send_ping; the loop must not care.
                        let _ = pinger.send_ping().await;
                        drop(permit);
                    });
                }
                _ = shutdown.recv() => {
                    tracing::info!("Ping scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        // Let in-flight attempts publish their records before returning.
        let all_slots = u32::try_from(self.max_in_flight).unwrap_or(u32::MAX);
        let _ = slots.acquire_many(all_slots).await;
        tracing::info!(ticks = stats.ticks, skipped = stats.skipped, "Ping scheduler stopped");
        stats
    }
}
