//! Broker counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Monotonic counters, updated lock-free.
#[derive(Debug, Default)]
pub struct BrokerStats {
    requests_created: AtomicU64,
    dispatch_failures: AtomicU64,
    callbacks_processed: AtomicU64,
    duplicate_callbacks: AtomicU64,
    unknown_correlations: AtomicU64,
    malformed_callbacks: AtomicU64,
    classification_failures: AtomicU64,
    pending_reaped: AtomicU64,
    dedup_reaped: AtomicU64,
}

/// Point-in-time copy of the counters plus current table sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests dispatched and correlated.
    pub requests_created: u64,
    /// Provider dispatch failures.
    pub dispatch_failures: u64,
    /// Callbacks that wrote a result.
    pub callbacks_processed: u64,
    /// Callbacks acknowledged as duplicates.
    pub duplicate_callbacks: u64,
    /// Callbacks with no correlation.
    pub unknown_correlations: u64,
    /// Callbacks rejected as malformed.
    pub malformed_callbacks: u64,
    /// Classifications that hit a Record Store error.
    pub classification_failures: u64,
    /// Pending markers evicted by the reaper.
    pub pending_reaped: u64,
    /// Dedup records evicted by the reaper.
    pub dedup_reaped: u64,
    /// Handles currently pending.
    pub pending: usize,
    /// Correlation entries held.
    pub correlations: usize,
    /// Proof results held.
    pub results: usize,
    /// Credential results held.
    pub credential_results: usize,
}

macro_rules! bump {
    ($($name:ident),* $(,)?) => {
        $(
            pub(crate) fn $name(&self, n: u64) {
                self.$name.fetch_add(n, Ordering::Relaxed);
            }
        )*
    };
}

impl BrokerStats {
    bump!(
        requests_created,
        dispatch_failures,
        callbacks_processed,
        duplicate_callbacks,
        unknown_correlations,
        malformed_callbacks,
        classification_failures,
        pending_reaped,
        dedup_reaped,
    );

    /// Copy the counters. Table sizes are filled in by the broker.
    pub(crate) fn counters(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_created: self.requests_created.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            callbacks_processed: self.callbacks_processed.load(Ordering::Relaxed),
            duplicate_callbacks: self.duplicate_callbacks.load(Ordering::Relaxed),
            unknown_correlations: self.unknown_correlations.load(Ordering::Relaxed),
            malformed_callbacks: self.malformed_callbacks.load(Ordering::Relaxed),
            classification_failures: self.classification_failures.load(Ordering::Relaxed),
            pending_reaped: self.pending_reaped.load(Ordering::Relaxed),
            dedup_reaped: self.dedup_reaped.load(Ordering::Relaxed),
            ..StatsSnapshot::default()
        }
    }
}
