//! Credential offers.

use proofgate_core::ProviderRef;
use serde::{Deserialize, Serialize};

use crate::error::NdiApiError;
use crate::NdiClient;

/// A credential offer to send to a holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    /// Attribute values of the credential.
    pub credential_data: serde_json::Value,
    /// Schema the credential is issued under.
    pub schema_id: String,
    /// Holder's DID.
    #[serde(rename = "holderDID")]
    pub holder_did: String,
    /// Relationship DID the offer is sent over.
    pub for_relationship: String,
}

#[derive(Deserialize)]
struct IssueEnvelope {
    data: IssueAccepted,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueAccepted {
    thread_id: String,
    #[serde(default, rename = "credentialOfferURL")]
    credential_offer_url: Option<String>,
    #[serde(default)]
    revocation_id: Option<String>,
}

/// A credential offer accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    /// The provider's thread id for the offer.
    pub provider_ref: ProviderRef,
    /// Offer URL for the holder's wallet, when the provider returns one.
    pub url: Option<String>,
    /// Revocation handle, for revocable schemas.
    pub revocation_id: Option<String>,
}

impl NdiClient {
    /// Send a credential offer.
    ///
    /// Calls `POST {NDI_ISSUER_URL}/issue-credential` with a bearer token.
    pub async fn issue_credential(
        &self,
        req: &IssueCredentialRequest,
    ) -> Result<IssuedCredential, NdiApiError> {
        let endpoint = "POST /issue-credential";
        let url = crate::join_url(&self.config.issuer_url, "issue-credential");
        let token = self.access_token().await?;

        let resp = crate::retry::retry_send(endpoint, || {
            self.http
                .post(&url)
                .bearer_auth(token.as_str())
                .json(req)
                .send()
        })
        .await
        .map_err(|e| NdiApiError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;
        let resp = crate::ensure_success(endpoint, resp).await?;

        let body: IssueEnvelope = resp.json().await.map_err(|e| NdiApiError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;
        let provider_ref =
            ProviderRef::new(body.data.thread_id).map_err(|e| NdiApiError::InvalidResponse {
                endpoint: endpoint.into(),
                reason: e.to_string(),
            })?;

        tracing::info!(provider_ref = %provider_ref, schema_id = %req.schema_id, "credential offer sent");
        Ok(IssuedCredential {
            provider_ref,
            url: body.data.credential_offer_url,
            revocation_id: body.data.revocation_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_provider_field_names() {
        let req = IssueCredentialRequest {
            credential_data: serde_json::json!({ "License No.": "CFA-001" }),
            schema_id: "schema-x".into(),
            holder_did: "did:key:holder".into(),
            for_relationship: "did:key:rel".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["holderDID"], "did:key:holder");
        assert_eq!(json["forRelationship"], "did:key:rel");
        assert_eq!(json["schemaId"], "schema-x");
    }
}
