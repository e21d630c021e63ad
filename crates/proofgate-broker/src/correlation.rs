//! # Correlation Table
//!
//! Bidirectional mapping between our [`RequestHandle`] and the provider's
//! [`ProviderRef`] for the same request. A primary map keyed by handle and a
//! reverse index keyed by provider reference are updated under one lock, so
//! both directions always agree.
//!
//! Entries are immutable and retained for the process lifetime.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use proofgate_core::{ProofKind, ProviderRef, RequestHandle};
use serde::Serialize;

/// What was dispatched under a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "kind")]
pub enum RequestKind {
    /// A proof request with the given template.
    Proof(ProofKind),
    /// A credential offer.
    Credential,
}

impl RequestKind {
    /// Whether this is a proof request.
    pub fn is_proof(&self) -> bool {
        matches!(self, Self::Proof(_))
    }
}

/// One correlated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationEntry {
    /// Our handle.
    pub handle: RequestHandle,
    /// The provider's reference.
    pub provider_ref: ProviderRef,
    /// What was dispatched.
    pub kind: RequestKind,
    /// Revocation handle returned at credential issuance.
    pub revocation_id: Option<String>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// Why an entry could not be recorded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    /// The handle already has an entry.
    #[error("handle {0} is already correlated")]
    DuplicateHandle(RequestHandle),
    /// The provider reference already maps to another handle.
    #[error("provider reference {0} is already correlated")]
    DuplicateProviderRef(ProviderRef),
}

#[derive(Debug, Default)]
struct Inner {
    by_handle: HashMap<RequestHandle, CorrelationEntry>,
    by_ref: HashMap<ProviderRef, RequestHandle>,
}

/// Thread-safe correlation table.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    inner: RwLock<Inner>,
}

impl CorrelationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry in both directions.
    pub fn record(&self, entry: CorrelationEntry) -> Result<(), CorrelationError> {
        let mut inner = self.inner.write();
        if inner.by_handle.contains_key(&entry.handle) {
            return Err(CorrelationError::DuplicateHandle(entry.handle));
        }
        if inner.by_ref.contains_key(&entry.provider_ref) {
            return Err(CorrelationError::DuplicateProviderRef(entry.provider_ref));
        }
        inner
            .by_ref
            .insert(entry.provider_ref.clone(), entry.handle);
        inner.by_handle.insert(entry.handle, entry);
        Ok(())
    }

    /// Find the entry for a provider reference. `None` means "not our
    /// request".
    pub fn resolve_by_provider_ref(&self, provider_ref: &ProviderRef) -> Option<CorrelationEntry> {
        let inner = self.inner.read();
        inner
            .by_ref
            .get(provider_ref)
            .and_then(|h| inner.by_handle.get(h))
            .cloned()
    }

    /// Find the entry for a handle.
    pub fn get(&self, handle: &RequestHandle) -> Option<CorrelationEntry> {
        self.inner.read().by_handle.get(handle).cloned()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().by_handle.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofgate_core::HandleGenerator;

    fn entry(handle: RequestHandle, provider_ref: &str) -> CorrelationEntry {
        CorrelationEntry {
            handle,
            provider_ref: ProviderRef::new(provider_ref).unwrap(),
            kind: RequestKind::Proof(ProofKind::Normal),
            revocation_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn record_then_resolve_both_directions() {
        let table = CorrelationTable::new();
        let h = HandleGenerator::new().issue();
        table.record(entry(h, "ndi-999")).unwrap();

        let found = table
            .resolve_by_provider_ref(&ProviderRef::new("ndi-999").unwrap())
            .unwrap();
        assert_eq!(found.handle, h);
        assert_eq!(table.get(&h).unwrap().provider_ref.as_str(), "ndi-999");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_provider_ref_resolves_to_nothing() {
        let table = CorrelationTable::new();
        assert!(table
            .resolve_by_provider_ref(&ProviderRef::new("never-seen").unwrap())
            .is_none());
    }

    #[test]
    fn duplicate_handle_is_rejected_and_table_unchanged() {
        let table = CorrelationTable::new();
        let h = HandleGenerator::new().issue();
        table.record(entry(h, "a")).unwrap();

        let err = table.record(entry(h, "b")).unwrap_err();
        assert_eq!(err, CorrelationError::DuplicateHandle(h));
        assert!(table
            .resolve_by_provider_ref(&ProviderRef::new("b").unwrap())
            .is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn duplicate_provider_ref_is_rejected() {
        let table = CorrelationTable::new();
        let gen = HandleGenerator::new();
        let first = gen.issue();
        table.record(entry(first, "same")).unwrap();

        let err = table.record(entry(gen.issue(), "same")).unwrap_err();
        assert!(matches!(err, CorrelationError::DuplicateProviderRef(_)));
        let still = table
            .resolve_by_provider_ref(&ProviderRef::new("same").unwrap())
            .unwrap();
        assert_eq!(still.handle, first);
    }

    proptest::proptest! {
        #[test]
        fn reverse_index_inverts_every_recorded_entry(
            refs in proptest::collection::hash_set("[a-z0-9-]{1,24}", 1..40)
        ) {
            let table = CorrelationTable::new();
            let gen = HandleGenerator::new();
            let recorded: Vec<(RequestHandle, String)> = refs
                .into_iter()
                .map(|r| {
                    let h = gen.issue();
                    table.record(entry(h, &r)).unwrap();
                    (h, r)
                })
                .collect();

            proptest::prop_assert_eq!(table.len(), recorded.len());
            for (h, r) in &recorded {
                let found = table.resolve_by_provider_ref(&ProviderRef::new(r.as_str()).unwrap());
                proptest::prop_assert_eq!(found.map(|e| e.handle), Some(*h));
            }
        }
    }
}
