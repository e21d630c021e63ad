//! # Provider Adapters
//!
//! [`NdiProvider`] adapts the typed NDI client to the broker's
//! [`VerificationProvider`] collaborator trait. [`UnconfiguredProvider`]
//! stands in when no NDI credentials are present; routes check
//! [`AppState::provider_configured`](crate::state::AppState) first and
//! answer 503, so it is only reached if that check is skipped.

use async_trait::async_trait;
use proofgate_broker::{
    CredentialDispatch, CredentialOffer, ProviderDispatch, ProviderError, VerificationProvider,
};
use proofgate_core::{ProofKind, ProviderRef};
use proofgate_ndi_client::{IssueCredentialRequest, NdiApiError, NdiClient};

/// The live NDI provider.
#[derive(Debug, Clone)]
pub struct NdiProvider {
    client: NdiClient,
}

impl NdiProvider {
    pub fn new(client: NdiClient) -> Self {
        Self { client }
    }
}

fn provider_error(err: NdiApiError) -> ProviderError {
    ProviderError(err.to_string())
}

#[async_trait]
impl VerificationProvider for NdiProvider {
    async fn dispatch_request(&self, kind: ProofKind) -> Result<ProviderDispatch, ProviderError> {
        let dispatched = self
            .client
            .dispatch_proof_request(kind)
            .await
            .map_err(provider_error)?;
        Ok(ProviderDispatch {
            provider_ref: dispatched.provider_ref,
            client_url: dispatched.url,
        })
    }

    async fn dispatch_credential(
        &self,
        offer: &CredentialOffer,
    ) -> Result<CredentialDispatch, ProviderError> {
        let req = IssueCredentialRequest {
            credential_data: offer.credential_data.clone(),
            schema_id: offer.schema_id.clone(),
            holder_did: offer.holder_did.clone(),
            for_relationship: offer.for_relationship.clone(),
        };
        let issued = self
            .client
            .issue_credential(&req)
            .await
            .map_err(provider_error)?;
        Ok(CredentialDispatch {
            provider_ref: issued.provider_ref,
            client_url: issued.url,
            revocation_id: issued.revocation_id,
        })
    }

    async fn subscribe_callbacks(&self, provider_ref: &ProviderRef) -> Result<(), ProviderError> {
        self.client
            .subscribe(provider_ref)
            .await
            .map_err(provider_error)
    }
}

/// Provider used when NDI is not configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

const UNCONFIGURED: &str = "verification provider not configured";

#[async_trait]
impl VerificationProvider for UnconfiguredProvider {
    async fn dispatch_request(&self, _kind: ProofKind) -> Result<ProviderDispatch, ProviderError> {
        Err(ProviderError(UNCONFIGURED.into()))
    }

    async fn dispatch_credential(
        &self,
        _offer: &CredentialOffer,
    ) -> Result<CredentialDispatch, ProviderError> {
        Err(ProviderError(UNCONFIGURED.into()))
    }

    async fn subscribe_callbacks(&self, _provider_ref: &ProviderRef) -> Result<(), ProviderError> {
        Err(ProviderError(UNCONFIGURED.into()))
    }
}
