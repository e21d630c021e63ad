//! # Result Caches
//!
//! Write-once maps from handle to terminal result. A second write for the
//! same handle is refused and leaves the first result in place. Entries are
//! retained for the process lifetime.

use std::collections::HashMap;

use parking_lot::RwLock;
use proofgate_core::RequestHandle;

use crate::model::{CredentialResult, VerificationResult};

/// A result already exists for this handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("result for {0} already written")]
pub struct AlreadyWritten(pub RequestHandle);

/// Generic write-once cache.
#[derive(Debug)]
pub struct WriteOnceCache<T> {
    entries: RwLock<HashMap<RequestHandle, T>>,
}

impl<T> Default for WriteOnceCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> WriteOnceCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `handle` unless one is already stored.
    pub fn put(&self, handle: RequestHandle, value: T) -> Result<(), AlreadyWritten> {
        let mut entries = self.entries.write();
        if entries.contains_key(&handle) {
            return Err(AlreadyWritten(handle));
        }
        entries.insert(handle, value);
        Ok(())
    }

    /// The stored result, if any.
    pub fn get(&self, handle: &RequestHandle) -> Option<T> {
        self.entries.read().get(handle).cloned()
    }

    /// Whether a result is stored.
    pub fn contains(&self, handle: &RequestHandle) -> bool {
        self.entries.read().contains_key(handle)
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Proof results.
pub type ResultCache = WriteOnceCache<VerificationResult>;

/// Credential results.
pub type CredentialResultCache = WriteOnceCache<CredentialResult>;

#[cfg(test)]
mod tests {
    use super::*;
    use proofgate_core::HandleGenerator;

    #[test]
    fn second_write_is_refused_and_first_kept() {
        let cache: WriteOnceCache<&'static str> = WriteOnceCache::new();
        let h = HandleGenerator::new().issue();
        cache.put(h, "first").unwrap();
        assert_eq!(cache.put(h, "second"), Err(AlreadyWritten(h)));
        assert_eq!(cache.get(&h), Some("first"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_handle_reads_none() {
        let cache: WriteOnceCache<u8> = WriteOnceCache::new();
        assert!(cache.get(&HandleGenerator::new().issue()).is_none());
        assert!(cache.is_empty());
    }
}
