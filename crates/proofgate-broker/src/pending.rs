//! # Pending Registry
//!
//! Handles whose outcome has not arrived yet, each with the instant it was
//! marked. Used to answer "still pending" on poll and by the reaper to
//! forget requests that were never answered.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use proofgate_core::RequestHandle;

/// Thread-safe set of pending handles.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    markers: Mutex<HashMap<RequestHandle, DateTime<Utc>>>,
}

impl PendingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `handle` pending as of `now`.
    pub fn mark_pending(&self, handle: RequestHandle, now: DateTime<Utc>) {
        self.markers.lock().insert(handle, now);
    }

    /// Whether `handle` is pending.
    pub fn is_pending(&self, handle: &RequestHandle) -> bool {
        self.markers.lock().contains_key(handle)
    }

    /// Remove the marker. Returns whether one was present; clearing an
    /// absent marker is a no-op.
    pub fn clear_pending(&self, handle: &RequestHandle) -> bool {
        self.markers.lock().remove(handle).is_some()
    }

    /// Remove every marker strictly older than `max_age` at `now`.
    /// Returns the number removed.
    pub fn sweep_expired(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - max_age;
        let mut markers = self.markers.lock();
        let before = markers.len();
        markers.retain(|_, marked_at| *marked_at >= cutoff);
        before - markers.len()
    }

    /// Number of pending handles.
    pub fn len(&self) -> usize {
        self.markers.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proofgate_core::HandleGenerator;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn mark_and_clear() {
        let reg = PendingRegistry::new();
        let h = HandleGenerator::new().issue();
        reg.mark_pending(h, t0());
        assert!(reg.is_pending(&h));
        assert!(reg.clear_pending(&h));
        assert!(!reg.is_pending(&h));
    }

    #[test]
    fn clearing_twice_is_a_no_op() {
        let reg = PendingRegistry::new();
        let h = HandleGenerator::new().issue();
        reg.mark_pending(h, t0());
        assert!(reg.clear_pending(&h));
        assert!(!reg.clear_pending(&h));
        assert!(reg.is_empty());
    }

    #[test]
    fn sweep_keeps_young_markers_and_evicts_old() {
        let reg = PendingRegistry::new();
        let gen = HandleGenerator::new();
        let old = gen.issue();
        let young = gen.issue();
        reg.mark_pending(old, t0());
        reg.mark_pending(young, t0() + Duration::minutes(30));

        let ttl = Duration::hours(1);
        assert_eq!(reg.sweep_expired(ttl, t0() + Duration::minutes(59)), 0);
        assert_eq!(reg.sweep_expired(ttl, t0() + Duration::minutes(61)), 1);
        assert!(!reg.is_pending(&old));
        assert!(reg.is_pending(&young));
    }

    #[test]
    fn marker_exactly_at_horizon_survives() {
        let reg = PendingRegistry::new();
        let h = HandleGenerator::new().issue();
        reg.mark_pending(h, t0());
        assert_eq!(reg.sweep_expired(Duration::hours(1), t0() + Duration::hours(1)), 0);
        assert!(reg.is_pending(&h));
    }
}
