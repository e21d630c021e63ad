//! # Reaper
//!
//! Periodic sweep that forgets requests nobody answered. Each tick evicts
//! pending markers and dedup records older than the broker's TTL horizon;
//! results and correlations are left alone.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::broker::VerificationBroker;

/// What one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Pending markers evicted.
    pub pending_evicted: usize,
    /// Dedup records evicted.
    pub dedup_evicted: usize,
}

/// Spawn the reaper loop. It sweeps every `period` until `shutdown` fires
/// (or its sender is dropped). The first sweep happens one period after
/// start.
pub fn spawn_reaper(
    broker: Arc<VerificationBroker>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(period_secs = period.as_secs(), "reaper started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("reaper shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let report = broker.sweep_now();
                    if report.pending_evicted > 0 || report.dedup_evicted > 0 {
                        tracing::info!(
                            pending_evicted = report.pending_evicted,
                            dedup_evicted = report.dedup_evicted,
                            "reaper sweep"
                        );
                    } else {
                        tracing::debug!("reaper sweep: nothing to evict");
                    }
                }
            }
        }
    })
}
