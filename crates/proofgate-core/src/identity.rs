//! # Identifier Newtypes
//!
//! - [`RequestHandle`]: our identifier for one logical verification request.
//!   Random (UUID v4, 122 bits from the OS RNG), so a handle is never reissued
//!   and cannot be guessed from another client's handle.
//! - [`ProviderRef`]: the verification provider's identifier for the same
//!   request (the provider's thread id). Opaque to us.
//! - [`SessionToken`]: opaque bearer token handed to a verified business
//!   owner as part of a successful verification result.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum accepted length of a provider reference.
const MAX_PROVIDER_REF_LEN: usize = 256;

/// Length of the canonical hyphenated handle form.
const HANDLE_LEN: usize = 36;

// ---------------------------------------------------------------------------
// RequestHandle
// ---------------------------------------------------------------------------

/// Client-visible identifier for a verification request.
///
/// Serializes as the hyphenated lowercase UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestHandle(Uuid);

impl RequestHandle {
    /// Parse a handle received from a client.
    ///
    /// Only the canonical hyphenated form of a version-4 UUID is accepted,
    /// which is exactly what [`HandleGenerator`] produces.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if s.len() != HANDLE_LEN {
            return Err(ValidationError::InvalidHandle(format!(
                "expected {HANDLE_LEN} characters, got {}",
                s.len()
            )));
        }
        let uuid = Uuid::parse_str(s)
            .map_err(|e| ValidationError::InvalidHandle(e.to_string()))?;
        if uuid.get_version_num() != 4 {
            return Err(ValidationError::InvalidHandle(
                "not a generated handle".to_string(),
            ));
        }
        Ok(Self(uuid))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RequestHandle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// HandleGenerator
// ---------------------------------------------------------------------------

/// Produces fresh request handles.
///
/// Generation cannot fail. The generator keeps a count of issued handles
/// for diagnostics only; uniqueness comes from the entropy source.
#[derive(Debug, Default)]
pub struct HandleGenerator {
    issued: AtomicU64,
}

impl HandleGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new, never-before-seen handle.
    pub fn issue(&self) -> RequestHandle {
        self.issued.fetch_add(1, Ordering::Relaxed);
        RequestHandle(Uuid::new_v4())
    }

    /// Number of handles issued by this generator.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// ProviderRef
// ---------------------------------------------------------------------------

/// The verification provider's identifier for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderRef(String);

impl ProviderRef {
    /// Validate and wrap a provider reference.
    ///
    /// Leading and trailing whitespace is stripped; the result must be
    /// non-empty and at most 256 bytes.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidProviderRef(
                "must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_PROVIDER_REF_LEN {
            return Err(ValidationError::InvalidProviderRef(format!(
                "must not exceed {MAX_PROVIDER_REF_LEN} bytes"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProviderRef {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProviderRef> for String {
    fn from(value: ProviderRef) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// SessionToken
// ---------------------------------------------------------------------------

/// Opaque session token issued to a verified business owner.
///
/// 32 random bytes, hex-encoded. `Debug` redacts the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh token from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Return the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn issued_handles_are_distinct() {
        let generator = HandleGenerator::new();
        let handles: HashSet<RequestHandle> = (0..10_000).map(|_| generator.issue()).collect();
        assert_eq!(handles.len(), 10_000);
        assert_eq!(generator.issued(), 10_000);
    }

    #[test]
    fn handle_display_parses_back() {
        let handle = HandleGenerator::new().issue();
        let parsed = RequestHandle::parse(&handle.to_string()).unwrap();
        assert_eq!(parsed, handle);
    }

    #[test]
    fn handle_rejects_wrong_shape() {
        assert!(RequestHandle::parse("").is_err());
        assert!(RequestHandle::parse("abc123").is_err());
        assert!(RequestHandle::parse("../../etc/passwd").is_err());
        // Simple (non-hyphenated) form is not the generator's format.
        let simple = Uuid::new_v4().simple().to_string();
        assert!(RequestHandle::parse(&simple).is_err());
    }

    #[test]
    fn handle_rejects_non_v4_uuid() {
        let nil = Uuid::nil().hyphenated().to_string();
        let err = RequestHandle::parse(&nil).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidHandle(_)));
    }

    #[test]
    fn handle_serializes_as_plain_string() {
        let handle = HandleGenerator::new().issue();
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, format!("\"{handle}\""));
    }

    #[test]
    fn provider_ref_trims_and_validates() {
        let r = ProviderRef::new("  ndi-999 ").unwrap();
        assert_eq!(r.as_str(), "ndi-999");
        assert!(ProviderRef::new("   ").is_err());
        assert!(ProviderRef::new("x".repeat(257)).is_err());
    }

    #[test]
    fn provider_ref_deserialize_validates() {
        let ok: ProviderRef = serde_json::from_str("\"thread-1\"").unwrap();
        assert_eq!(ok.as_str(), "thread-1");
        assert!(serde_json::from_str::<ProviderRef>("\"\"").is_err());
    }

    #[test]
    fn session_token_is_hex_and_redacted() {
        let token = SessionToken::generate();
        assert_eq!(token.as_str().len(), 64);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(format!("{token:?}"), "SessionToken([REDACTED])");
        assert_ne!(token, SessionToken::generate());
    }

    proptest! {
        #[test]
        fn batches_of_handles_never_collide(n in 1usize..2_000) {
            let generator = HandleGenerator::new();
            let set: HashSet<RequestHandle> = (0..n).map(|_| generator.issue()).collect();
            prop_assert_eq!(set.len(), n);
        }

        #[test]
        fn arbitrary_strings_never_panic_the_parser(s in ".*") {
            let _ = RequestHandle::parse(&s);
        }
    }
}
