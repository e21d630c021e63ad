//! # Verification Broker
//!
//! Facade over the correlation subsystem. Owns every shared table and
//! exposes only the operations the HTTP layer needs:
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | [`create_request`](VerificationBroker::create_request) | dispatch → correlate → mark pending → subscribe |
//! | [`issue_credential`](VerificationBroker::issue_credential) | same, for a credential offer |
//! | [`poll`](VerificationBroker::poll) | result, else pending, else not found |
//! | [`ingest`](VerificationBroker::ingest) | parse → resolve → dedup claim → classify → write result → clear pending → complete dedup |
//! | [`sweep`](VerificationBroker::sweep) | evict old pending markers and dedup records |
//!
//! ## Ordering
//!
//! - The correlation entry is recorded before `create_request` returns, so
//!   the client never holds a handle whose callback could not be resolved.
//! - On ingest the result is written *before* the pending marker is cleared,
//!   and `poll` reads the result *before* the pending marker. A poll racing a
//!   callback therefore sees either "pending" or the result, never a false
//!   "not found".
//! - No table lock is held across an `.await`.
//! - A dedup claim is held in a [`ClaimGuard`] across classification. If the
//!   webhook future is dropped there, the claim is released and the
//!   provider's retry is processed normally.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use proofgate_core::{HandleGenerator, ProofKind, ProviderRef, RequestHandle, SharedClock};
use proofgate_records::RecordStore;

use crate::classifier::IdentityClassifier;
use crate::correlation::{CorrelationEntry, CorrelationError, CorrelationTable, RequestKind};
use crate::dedup::{ClaimGuard, DedupLedger, DedupSummary};
use crate::error::{BrokerError, IngestError};
use crate::model::{CredentialResult, Outcome, SubjectKind, VerificationResult};
use crate::payload::{Callback, CredentialCallback, PresentationCallback};
use crate::pending::PendingRegistry;
use crate::provider::{CredentialOffer, VerificationProvider};
use crate::reaper::SweepReport;
use crate::results::{CredentialResultCache, ResultCache};
use crate::stats::{BrokerStats, StatsSnapshot};

/// Broker tuning.
#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig {
    /// Age after which pending markers and dedup records are evicted.
    pub pending_ttl: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::hours(1),
        }
    }
}

/// A dispatched proof request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRequest {
    /// Our handle; the only id the client polls with.
    pub handle: RequestHandle,
    /// The provider's reference.
    pub provider_ref: ProviderRef,
    /// URL for the holder's wallet.
    pub client_url: String,
}

/// A dispatched credential offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCredential {
    /// Our handle.
    pub handle: RequestHandle,
    /// The provider's reference.
    pub provider_ref: ProviderRef,
    /// Offer URL, when the provider returned one.
    pub client_url: Option<String>,
    /// Revocation handle.
    pub revocation_id: Option<String>,
}

/// Answer to a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Terminal result.
    Ready(T),
    /// Still waiting for the provider.
    Pending,
    /// Never existed, wrong kind, or expired.
    NotFound,
}

/// What ingesting a callback did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A result was written.
    Processed {
        /// Handle the callback resolved to.
        handle: RequestHandle,
        /// Outcome written.
        outcome: Outcome,
    },
    /// Already processed, or being processed by a concurrent delivery.
    Duplicate {
        /// Handle the callback resolved to.
        handle: RequestHandle,
    },
    /// A callback type that carries no result.
    Ignored {
        /// The callback type.
        kind: String,
    },
}

/// The asynchronous verification correlation subsystem.
pub struct VerificationBroker {
    handles: HandleGenerator,
    correlations: CorrelationTable,
    pending: PendingRegistry,
    dedup: DedupLedger,
    results: ResultCache,
    credentials: CredentialResultCache,
    classifier: IdentityClassifier,
    provider: Arc<dyn VerificationProvider>,
    clock: SharedClock,
    config: BrokerConfig,
    stats: BrokerStats,
}

impl std::fmt::Debug for VerificationBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationBroker")
            .field("correlations", &self.correlations.len())
            .field("pending", &self.pending.len())
            .field("results", &self.results.len())
            .field("classifier", &self.classifier)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Show only the last four characters of an identity number.
pub(crate) fn mask(id: &str) -> String {
    let tail: String = id
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("***{tail}")
}

impl VerificationBroker {
    /// Assemble a broker.
    pub fn new(
        provider: Arc<dyn VerificationProvider>,
        store: Arc<dyn RecordStore>,
        clock: SharedClock,
        config: BrokerConfig,
    ) -> Self {
        Self {
            handles: HandleGenerator::new(),
            correlations: CorrelationTable::new(),
            pending: PendingRegistry::new(),
            dedup: DedupLedger::new(),
            results: ResultCache::new(),
            credentials: CredentialResultCache::new(),
            classifier: IdentityClassifier::new(store),
            provider,
            clock,
            config,
            stats: BrokerStats::default(),
        }
    }

    /// The broker's tuning.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    // -- Request creation -------------------------------------------------

    /// Dispatch a proof request and start tracking it.
    ///
    /// On dispatch failure nothing is recorded.
    pub async fn create_request(&self, kind: ProofKind) -> Result<CreatedRequest, BrokerError> {
        let dispatch = self.provider.dispatch_request(kind).await.map_err(|e| {
            self.stats.dispatch_failures(1);
            tracing::error!(%kind, error = %e, "proof request dispatch failed");
            BrokerError::from(e)
        })?;

        let handle = self.register(dispatch.provider_ref.clone(), RequestKind::Proof(kind), None)?;
        self.subscribe_best_effort(handle, &dispatch.provider_ref).await;

        tracing::info!(%handle, provider_ref = %dispatch.provider_ref, %kind, "proof request created");
        Ok(CreatedRequest {
            handle,
            provider_ref: dispatch.provider_ref,
            client_url: dispatch.client_url,
        })
    }

    /// Dispatch a credential offer and start tracking it.
    pub async fn issue_credential(
        &self,
        offer: &CredentialOffer,
    ) -> Result<CreatedCredential, BrokerError> {
        validate_offer(offer)?;

        let dispatch = self.provider.dispatch_credential(offer).await.map_err(|e| {
            self.stats.dispatch_failures(1);
            tracing::error!(schema_id = %offer.schema_id, error = %e, "credential dispatch failed");
            BrokerError::from(e)
        })?;

        let handle = self.register(
            dispatch.provider_ref.clone(),
            RequestKind::Credential,
            dispatch.revocation_id.clone(),
        )?;
        self.subscribe_best_effort(handle, &dispatch.provider_ref).await;

        tracing::info!(%handle, provider_ref = %dispatch.provider_ref, "credential offer created");
        Ok(CreatedCredential {
            handle,
            provider_ref: dispatch.provider_ref,
            client_url: dispatch.client_url,
            revocation_id: dispatch.revocation_id,
        })
    }

    fn register(
        &self,
        provider_ref: ProviderRef,
        kind: RequestKind,
        revocation_id: Option<String>,
    ) -> Result<RequestHandle, BrokerError> {
        let handle = self.handles.issue();
        let now = self.clock.now();
        self.correlations
            .record(CorrelationEntry {
                handle,
                provider_ref,
                kind,
                revocation_id,
                created_at: now,
            })
            .map_err(|e| {
                tracing::error!(error = %e, "correlation invariant violated");
                match e {
                    CorrelationError::DuplicateHandle(h) => BrokerError::DuplicateHandle(h),
                    CorrelationError::DuplicateProviderRef(r) => {
                        BrokerError::DuplicateProviderRef(r.to_string())
                    }
                }
            })?;
        self.pending.mark_pending(handle, now);
        self.stats.requests_created(1);
        Ok(handle)
    }

    async fn subscribe_best_effort(&self, handle: RequestHandle, provider_ref: &ProviderRef) {
        if let Err(e) = self.provider.subscribe_callbacks(provider_ref).await {
            tracing::warn!(
                %handle,
                provider_ref = %provider_ref,
                error = %e,
                "callback subscription failed; request stays pending"
            );
        }
    }

    // -- Polling ----------------------------------------------------------

    /// Poll a proof request.
    pub fn poll(&self, handle: &RequestHandle) -> PollStatus<VerificationResult> {
        if let Some(result) = self.results.get(handle) {
            return PollStatus::Ready(result);
        }
        if self.pending.is_pending(handle) && self.is_kind(handle, RequestKind::is_proof) {
            return PollStatus::Pending;
        }
        PollStatus::NotFound
    }

    /// Poll a credential offer.
    pub fn poll_credential(&self, handle: &RequestHandle) -> PollStatus<CredentialResult> {
        if let Some(result) = self.credentials.get(handle) {
            return PollStatus::Ready(result);
        }
        if self.pending.is_pending(handle)
            && self.is_kind(handle, |k| *k == RequestKind::Credential)
        {
            return PollStatus::Pending;
        }
        PollStatus::NotFound
    }

    fn is_kind(&self, handle: &RequestHandle, pred: impl Fn(&RequestKind) -> bool) -> bool {
        self.correlations
            .get(handle)
            .map(|e| pred(&e.kind))
            .unwrap_or(false)
    }

    // -- Callback ingestion -----------------------------------------------

    /// Ingest a provider callback body.
    pub async fn ingest(&self, body: &serde_json::Value) -> Result<IngestOutcome, IngestError> {
        let callback = Callback::parse(body).map_err(|e| {
            self.stats.malformed_callbacks(1);
            tracing::warn!(error = %e, "rejected callback");
            e
        })?;

        match callback {
            Callback::Presentation(p) => self.ingest_presentation(p).await,
            Callback::Credential(c) => self.ingest_credential(c),
            Callback::Ignored { kind } => {
                tracing::debug!(%kind, "ignoring callback type");
                Ok(IngestOutcome::Ignored { kind })
            }
        }
    }

    fn resolve(
        &self,
        provider_ref: &ProviderRef,
        expected: impl Fn(&RequestKind) -> bool,
    ) -> Result<CorrelationEntry, IngestError> {
        match self.correlations.resolve_by_provider_ref(provider_ref) {
            Some(entry) if expected(&entry.kind) => Ok(entry),
            found => {
                self.stats.unknown_correlations(1);
                tracing::warn!(
                    provider_ref = %provider_ref,
                    kind_mismatch = found.is_some(),
                    "callback for unknown correlation"
                );
                Err(IngestError::UnknownCorrelation(provider_ref.to_string()))
            }
        }
    }

    fn claim(&self, entry: &CorrelationEntry) -> Result<ClaimGuard<'_>, IngestOutcome> {
        self.dedup.begin(&entry.provider_ref, self.clock.now()).map_err(|_| {
            self.stats.duplicate_callbacks(1);
            tracing::info!(handle = %entry.handle, provider_ref = %entry.provider_ref, "duplicate callback");
            IngestOutcome::Duplicate {
                handle: entry.handle,
            }
        })
    }

    /// Settle a claim whose handle already has a result.
    ///
    /// Reached when the dedup record was reaped while the result survived.
    /// The stored result stands and its summary is recorded.
    fn keep_existing(
        &self,
        guard: ClaimGuard<'_>,
        entry: &CorrelationEntry,
        outcome: Outcome,
        subject_kind: Option<SubjectKind>,
    ) -> IngestOutcome {
        guard.complete(
            DedupSummary {
                handle: entry.handle,
                outcome,
                subject_kind,
            },
            self.clock.now(),
        );
        self.stats.duplicate_callbacks(1);
        tracing::info!(handle = %entry.handle, "result already written; keeping the first");
        IngestOutcome::Duplicate {
            handle: entry.handle,
        }
    }

    async fn ingest_presentation(
        &self,
        p: PresentationCallback,
    ) -> Result<IngestOutcome, IngestError> {
        let entry = self.resolve(&p.provider_ref, RequestKind::is_proof)?;
        let guard = match self.claim(&entry) {
            Ok(guard) => guard,
            Err(dup) => return Ok(dup),
        };
        if let Some(existing) = self.results.get(&entry.handle) {
            let subject_kind = existing.subject_kind();
            return Ok(self.keep_existing(guard, &entry, existing.outcome, Some(subject_kind)));
        }

        let verdict = self.classifier.classify(&p).await;
        if verdict.failed {
            self.stats.classification_failures(1);
        }

        let now = self.clock.now();
        let result = VerificationResult {
            handle: entry.handle,
            outcome: verdict.outcome,
            verified: p.verified,
            subject: verdict.subject,
            message: verdict.message,
            provider_meta: p.meta,
            timestamp: now,
        };
        let subject_kind = result.subject_kind();
        let outcome = result.outcome;
        self.finish(guard, &entry, now, outcome, Some(subject_kind), |h| {
            self.results.put(h, result).is_ok()
        })
    }

    fn ingest_credential(&self, c: CredentialCallback) -> Result<IngestOutcome, IngestError> {
        let entry = self.resolve(&c.provider_ref, |k| *k == RequestKind::Credential)?;
        let Some(accepted) = c.accepted else {
            tracing::debug!(handle = %entry.handle, event = %c.event, "intermediate credential event");
            return Ok(IngestOutcome::Ignored { kind: c.event });
        };
        let guard = match self.claim(&entry) {
            Ok(guard) => guard,
            Err(dup) => return Ok(dup),
        };
        if let Some(existing) = self.credentials.get(&entry.handle) {
            return Ok(self.keep_existing(guard, &entry, existing.status, None));
        }

        let now = self.clock.now();
        let outcome = if accepted { Outcome::Success } else { Outcome::Error };
        let message = if accepted {
            "Credential accepted".to_string()
        } else {
            format!("Credential not accepted ({})", c.event)
        };
        let result = CredentialResult {
            handle: entry.handle,
            status: outcome,
            accepted,
            revocation_id: entry.revocation_id.clone(),
            message,
            provider_meta: c.meta,
            timestamp: now,
        };
        self.finish(guard, &entry, now, outcome, None, |h| {
            self.credentials.put(h, result).is_ok()
        })
    }

    /// Write the result, clear pending, complete the dedup claim.
    fn finish(
        &self,
        guard: ClaimGuard<'_>,
        entry: &CorrelationEntry,
        now: DateTime<Utc>,
        outcome: Outcome,
        subject_kind: Option<SubjectKind>,
        write: impl FnOnce(RequestHandle) -> bool,
    ) -> Result<IngestOutcome, IngestError> {
        let written = write(entry.handle);
        self.pending.clear_pending(&entry.handle);
        guard.complete(
            DedupSummary {
                handle: entry.handle,
                outcome,
                subject_kind,
            },
            now,
        );

        if !written {
            // The dedup claim serialises writers and the cache was checked
            // before classifying, so this only guards the write-once rule.
            self.stats.duplicate_callbacks(1);
            tracing::warn!(handle = %entry.handle, "result already written; keeping the first");
            return Ok(IngestOutcome::Duplicate {
                handle: entry.handle,
            });
        }

        self.stats.callbacks_processed(1);
        tracing::info!(
            handle = %entry.handle,
            provider_ref = %entry.provider_ref,
            ?outcome,
            ?subject_kind,
            "callback processed"
        );
        Ok(IngestOutcome::Processed {
            handle: entry.handle,
            outcome,
        })
    }

    // -- Reaping ----------------------------------------------------------

    /// Evict pending markers and dedup records older than the TTL at `now`.
    ///
    /// Results and correlations are never evicted.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let ttl = self.config.pending_ttl;
        let report = SweepReport {
            pending_evicted: self.pending.sweep_expired(ttl, now),
            dedup_evicted: self.dedup.sweep_expired(ttl, now),
        };
        self.stats.pending_reaped(report.pending_evicted as u64);
        self.stats.dedup_reaped(report.dedup_evicted as u64);
        report
    }

    /// [`sweep`](Self::sweep) at the broker clock's current time.
    pub fn sweep_now(&self) -> SweepReport {
        self.sweep(self.clock.now())
    }

    // -- Introspection ----------------------------------------------------

    /// Counters and table sizes.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            pending: self.pending.len(),
            correlations: self.correlations.len(),
            results: self.results.len(),
            credential_results: self.credentials.len(),
            ..self.stats.counters()
        }
    }
}

fn validate_offer(offer: &CredentialOffer) -> Result<(), BrokerError> {
    let missing: Vec<&str> = [
        ("credentialData", offer.credential_data.is_null()),
        ("schemaId", offer.schema_id.trim().is_empty()),
        ("holderDid", offer.holder_did.trim().is_empty()),
        ("forRelationship", offer.for_relationship.trim().is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BrokerError::InvalidRequest(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}
