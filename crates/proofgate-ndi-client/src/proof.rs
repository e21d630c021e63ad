//! # Proof Requests
//!
//! Two templates, selected by [`ProofKind`]:
//!
//! | Kind     | Proof name               | Attributes |
//! |----------|--------------------------|------------|
//! | `normal` | Verify Foundational ID   | `ID Number`, `Full Name` |
//! | `agent`  | CFA Credential           | `License No.`, `CFA Name`, `CFA Employee CID` |
//!
//! Every attribute is restricted to the template's schema. The provider
//! answers with its thread id (our [`ProviderRef`]) and a URL the holder's
//! wallet opens, usually rendered as a QR code.

use proofgate_core::{ProofKind, ProviderRef};
use serde::{Deserialize, Serialize};

use crate::error::NdiApiError;
use crate::NdiClient;

/// Attribute names of the foundational-ID template.
pub const FOUNDATIONAL_ATTRIBUTES: [&str; 2] = ["ID Number", "Full Name"];

/// Attribute names of the agent-credential template.
pub const AGENT_ATTRIBUTES: [&str; 3] = ["License No.", "CFA Name", "CFA Employee CID"];

/// Schema restriction on a requested attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    /// Schema the attribute must have been issued under.
    pub schema_name: String,
}

/// One requested attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofAttribute {
    /// Attribute name as it appears in the credential.
    pub name: String,
    /// Accepted issuance restrictions.
    pub restrictions: Vec<Restriction>,
}

/// Body of a proof request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofTemplate {
    /// Human-readable proof name shown in the wallet.
    pub proof_name: String,
    /// Requested attributes.
    pub proof_attributes: Vec<ProofAttribute>,
}

impl ProofTemplate {
    /// Build the template for `kind` with the given schema restriction.
    pub fn for_kind(kind: ProofKind, schema: &str) -> Self {
        let (proof_name, names): (&str, &[&str]) = match kind {
            ProofKind::Normal => ("Verify Foundational ID", &FOUNDATIONAL_ATTRIBUTES),
            ProofKind::Agent => ("CFA Credential", &AGENT_ATTRIBUTES),
        };
        Self {
            proof_name: proof_name.to_string(),
            proof_attributes: names
                .iter()
                .map(|name| ProofAttribute {
                    name: (*name).to_string(),
                    restrictions: vec![Restriction {
                        schema_name: schema.to_string(),
                    }],
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct ProofEnvelope {
    data: ProofCreated,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofCreated {
    proof_request_thread_id: String,
    #[serde(rename = "proofRequestURL")]
    proof_request_url: String,
}

/// A proof request accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedProof {
    /// The provider's thread id.
    pub provider_ref: ProviderRef,
    /// URL for the holder's wallet.
    pub url: String,
}

impl NdiClient {
    /// Send a proof request of the given kind.
    ///
    /// Calls `POST {NDI_VERIFIER_URL}` with a bearer token.
    pub async fn dispatch_proof_request(
        &self,
        kind: ProofKind,
    ) -> Result<DispatchedProof, NdiApiError> {
        let endpoint = "POST /proof-request";
        let schema = match kind {
            ProofKind::Normal => &self.config.foundational_schema,
            ProofKind::Agent => &self.config.agent_schema,
        };
        let template = ProofTemplate::for_kind(kind, schema);
        let token = self.access_token().await?;
        let url = self.config.verifier_url.as_str();

        let resp = crate::retry::retry_send(endpoint, || {
            self.http
                .post(url)
                .bearer_auth(token.as_str())
                .json(&template)
                .send()
        })
        .await
        .map_err(|e| NdiApiError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;
        let resp = crate::ensure_success(endpoint, resp).await?;

        let body: ProofEnvelope = resp.json().await.map_err(|e| NdiApiError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;
        let provider_ref = ProviderRef::new(body.data.proof_request_thread_id).map_err(|e| {
            NdiApiError::InvalidResponse {
                endpoint: endpoint.into(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(%kind, provider_ref = %provider_ref, "proof request dispatched");
        Ok(DispatchedProof {
            provider_ref,
            url: body.data.proof_request_url,
        })
    }
}
