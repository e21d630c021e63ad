//! # Verification Provider Collaborator
//!
//! The broker never speaks HTTP to the provider itself. It calls a
//! [`VerificationProvider`]; the service wires in an adapter over the real
//! NDI client, tests wire in [`ScriptedProvider`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use proofgate_core::{ProofKind, ProviderRef};
use serde::{Deserialize, Serialize};

/// A provider call failed. The message is for logs only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// A proof request accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDispatch {
    /// The provider's identifier for the request.
    pub provider_ref: ProviderRef,
    /// URL the holder's wallet opens (typically shown as a QR code).
    pub client_url: String,
}

/// A credential offer to hand to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialOffer {
    /// Credential attribute values.
    pub credential_data: serde_json::Value,
    /// Schema to issue under.
    pub schema_id: String,
    /// Holder's DID.
    pub holder_did: String,
    /// Relationship DID to send the offer over.
    pub for_relationship: String,
}

/// A credential offer accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDispatch {
    /// The provider's identifier for the offer.
    pub provider_ref: ProviderRef,
    /// Offer URL, when the provider returns one.
    pub client_url: Option<String>,
    /// Revocation handle, for revocable schemas.
    pub revocation_id: Option<String>,
}

/// The external verification provider, as the broker sees it.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Send a proof request of the given kind.
    async fn dispatch_request(&self, kind: ProofKind) -> Result<ProviderDispatch, ProviderError>;

    /// Send a credential offer.
    async fn dispatch_credential(
        &self,
        offer: &CredentialOffer,
    ) -> Result<CredentialDispatch, ProviderError>;

    /// Ask the provider to deliver callbacks for `provider_ref`.
    async fn subscribe_callbacks(&self, provider_ref: &ProviderRef) -> Result<(), ProviderError>;
}

/// In-process provider with scripted answers.
///
/// Hands out queued provider references first, then `ndi-1`, `ndi-2`, ….
/// Dispatch and subscription can each be made to fail.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    queued: Mutex<VecDeque<String>>,
    counter: AtomicU64,
    fail_dispatch: AtomicBool,
    fail_subscribe: AtomicBool,
    dispatched: Mutex<Vec<ProofKind>>,
    subscribed: Mutex<Vec<ProviderRef>>,
}

impl ScriptedProvider {
    /// Create a provider that succeeds at everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `provider_ref` for the next dispatch.
    pub fn queue_ref(&self, provider_ref: impl Into<String>) {
        self.queued.lock().push_back(provider_ref.into());
    }

    /// Make dispatch calls fail (or succeed again).
    pub fn set_fail_dispatch(&self, fail: bool) {
        self.fail_dispatch.store(fail, Ordering::SeqCst);
    }

    /// Make subscription calls fail (or succeed again).
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Proof kinds dispatched so far.
    pub fn dispatched(&self) -> Vec<ProofKind> {
        self.dispatched.lock().clone()
    }

    /// Provider references subscribed so far.
    pub fn subscribed(&self) -> Vec<ProviderRef> {
        self.subscribed.lock().clone()
    }

    fn next_ref(&self) -> Result<ProviderRef, ProviderError> {
        let raw = self.queued.lock().pop_front().unwrap_or_else(|| {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            format!("ndi-{n}")
        });
        ProviderRef::new(raw).map_err(|e| ProviderError(e.to_string()))
    }

    fn check_dispatch(&self) -> Result<(), ProviderError> {
        if self.fail_dispatch.load(Ordering::SeqCst) {
            return Err(ProviderError("scripted dispatch failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl VerificationProvider for ScriptedProvider {
    async fn dispatch_request(&self, kind: ProofKind) -> Result<ProviderDispatch, ProviderError> {
        self.check_dispatch()?;
        let provider_ref = self.next_ref()?;
        self.dispatched.lock().push(kind);
        Ok(ProviderDispatch {
            client_url: format!("https://wallet.invalid/proof/{provider_ref}"),
            provider_ref,
        })
    }

    async fn dispatch_credential(
        &self,
        _offer: &CredentialOffer,
    ) -> Result<CredentialDispatch, ProviderError> {
        self.check_dispatch()?;
        let provider_ref = self.next_ref()?;
        Ok(CredentialDispatch {
            client_url: Some(format!("https://wallet.invalid/offer/{provider_ref}")),
            revocation_id: Some(format!("rev-{provider_ref}")),
            provider_ref,
        })
    }

    async fn subscribe_callbacks(&self, provider_ref: &ProviderRef) -> Result<(), ProviderError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ProviderError("scripted subscribe failure".into()));
        }
        self.subscribed.lock().push(provider_ref.clone());
        Ok(())
    }
}
