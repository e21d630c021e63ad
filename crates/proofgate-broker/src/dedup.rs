//! # Dedup Ledger
//!
//! At most one record per provider reference. A delivery first *claims* the
//! reference; the claim is an atomic check-and-set, so of two concurrent
//! deliveries of the same callback exactly one gets [`Claim::Fresh`]. The
//! winner either completes the claim (recording a summary) or releases it.
//!
//! [`DedupLedger::begin`] wraps a fresh claim in a [`ClaimGuard`]. Dropping
//! the guard without completing it releases the claim, so a delivery whose
//! future is cancelled mid-processing leaves the reference open for the
//! provider's retry.
//!
//! Records, in-flight or processed, are evicted by the reaper once older
//! than the TTL horizon.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use proofgate_core::{ProviderRef, RequestHandle};
use serde::Serialize;

use crate::model::{Outcome, SubjectKind};

/// What processing a callback produced, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupSummary {
    /// Handle the callback resolved to.
    pub handle: RequestHandle,
    /// Outcome written.
    pub outcome: Outcome,
    /// Classified subject, for proof callbacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_kind: Option<SubjectKind>,
}

#[derive(Debug, Clone)]
enum Record {
    InFlight { since: DateTime<Utc> },
    Processed { at: DateTime<Utc>, summary: DedupSummary },
}

impl Record {
    fn stamped_at(&self) -> DateTime<Utc> {
        match self {
            Self::InFlight { since } => *since,
            Self::Processed { at, .. } => *at,
        }
    }
}

/// Result of claiming a provider reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// First delivery; the caller must `complete` or `release`.
    Fresh,
    /// Another delivery is being processed right now.
    InFlight,
    /// Already processed.
    AlreadyProcessed(DedupSummary),
}

/// Thread-safe dedup ledger.
#[derive(Debug, Default)]
pub struct DedupLedger {
    records: Mutex<HashMap<ProviderRef, Record>>,
}

impl DedupLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `provider_ref` for processing.
    pub fn claim(&self, provider_ref: &ProviderRef, now: DateTime<Utc>) -> Claim {
        let mut records = self.records.lock();
        match records.get(provider_ref) {
            Some(Record::InFlight { .. }) => Claim::InFlight,
            Some(Record::Processed { summary, .. }) => Claim::AlreadyProcessed(summary.clone()),
            None => {
                records.insert(provider_ref.clone(), Record::InFlight { since: now });
                Claim::Fresh
            }
        }
    }

    /// Claim `provider_ref` and hold the claim in a guard.
    ///
    /// Returns the existing state as `Err` when the claim is not fresh.
    pub fn begin(
        &self,
        provider_ref: &ProviderRef,
        now: DateTime<Utc>,
    ) -> Result<ClaimGuard<'_>, Claim> {
        match self.claim(provider_ref, now) {
            Claim::Fresh => Ok(ClaimGuard {
                ledger: self,
                provider_ref: provider_ref.clone(),
                completed: false,
            }),
            other => Err(other),
        }
    }

    /// Record that processing finished.
    pub fn complete(&self, provider_ref: &ProviderRef, summary: DedupSummary, now: DateTime<Utc>) {
        self.records
            .lock()
            .insert(provider_ref.clone(), Record::Processed { at: now, summary });
    }

    /// Give up a claim without recording anything.
    pub fn release(&self, provider_ref: &ProviderRef) {
        let mut records = self.records.lock();
        if matches!(records.get(provider_ref), Some(Record::InFlight { .. })) {
            records.remove(provider_ref);
        }
    }

    /// Remove every record strictly older than `max_age` at `now`.
    /// Returns the number removed.
    pub fn sweep_expired(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - max_age;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, r| r.stamped_at() >= cutoff);
        before - records.len()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fresh claim held by one delivery.
///
/// Released on drop unless [`complete`](Self::complete) ran.
#[must_use = "dropping the guard releases the claim"]
#[derive(Debug)]
pub struct ClaimGuard<'a> {
    ledger: &'a DedupLedger,
    provider_ref: ProviderRef,
    completed: bool,
}

impl ClaimGuard<'_> {
    /// Record the summary and keep the claim.
    pub fn complete(mut self, summary: DedupSummary, now: DateTime<Utc>) {
        self.ledger.complete(&self.provider_ref, summary, now);
        self.completed = true;
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!(provider_ref = %self.provider_ref, "callback processing abandoned; releasing claim");
            self.ledger.release(&self.provider_ref);
        }
    }
}
