//! # Result Types
//!
//! A [`VerificationResult`] is the terminal, write-once outcome of one proof
//! request. It serializes flat, with the subject payload's fields next to the
//! status, which is the shape polling clients receive:
//!
//! ```json
//! { "handle": "…", "status": "error", "verified": true,
//!   "subjectKind": "Unregistered", "name": "Jane Doe", "id": "10987654321",
//!   "message": "Not a registered user", "providerMeta": { … },
//!   "timestamp": "2026-01-15T12:00:00Z" }
//! ```

use chrono::{DateTime, Utc};
use proofgate_core::{RequestHandle, SessionToken};
use serde::{Deserialize, Serialize};

/// Outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Not yet answered.
    Pending,
    /// Answered and accepted.
    Success,
    /// Answered and rejected, or could not be processed.
    Error,
}

/// Which local identity category a verified holder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    /// A registered business owner.
    Owner,
    /// An employee of a registered organization.
    OrgEmployee,
    /// No local record matches.
    Unregistered,
}

/// Subject fields, shaped by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subjectKind")]
pub enum SubjectPayload {
    /// Business owner. Carries a fresh session token.
    #[serde(rename_all = "camelCase")]
    Owner {
        /// Registered full name.
        name: String,
        /// Citizen ID number.
        id: String,
        /// Login username.
        username: String,
        /// Business license number.
        business_license: String,
        /// Session token for the owner's login.
        token: SessionToken,
    },
    /// Organization employee.
    #[serde(rename_all = "camelCase")]
    OrgEmployee {
        /// Employee's full name.
        name: String,
        /// Employee's citizen ID number.
        id: String,
        /// Organization license number.
        org_license: String,
        /// Organization name.
        org_name: String,
        /// Organization-assigned employee number.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        employee_id: Option<String>,
    },
    /// No match; the raw revealed name and identifier.
    Unregistered {
        /// Revealed name.
        name: String,
        /// Revealed identifier.
        id: String,
    },
}

impl SubjectPayload {
    /// The payload's kind.
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Owner { .. } => SubjectKind::Owner,
            Self::OrgEmployee { .. } => SubjectKind::OrgEmployee,
            Self::Unregistered { .. } => SubjectKind::Unregistered,
        }
    }
}

/// Provider-side details carried through from the callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMeta {
    /// Raw verification outcome string, e.g. `ProofValidated`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_result: Option<String>,
    /// Holder's DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_did: Option<String>,
    /// Relationship DID between holder and verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_did: Option<String>,
}

/// Terminal outcome of a proof request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// The request this result answers.
    pub handle: RequestHandle,
    /// `success` or `error`.
    #[serde(rename = "status")]
    pub outcome: Outcome,
    /// Whether the provider validated the proof.
    pub verified: bool,
    /// Classified subject.
    #[serde(flatten)]
    pub subject: SubjectPayload,
    /// Diagnostic for error outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Provider details.
    pub provider_meta: ProviderMeta,
    /// When the result was written.
    pub timestamp: DateTime<Utc>,
}

impl VerificationResult {
    /// The classified subject kind.
    pub fn subject_kind(&self) -> SubjectKind {
        self.subject.kind()
    }
}

/// Terminal outcome of a credential offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResult {
    /// The request this result answers.
    pub handle: RequestHandle,
    /// `success` when accepted, `error` otherwise.
    pub status: Outcome,
    /// Whether the holder accepted the credential.
    pub accepted: bool,
    /// Revocation handle returned at issuance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_id: Option<String>,
    /// Human-readable summary.
    pub message: String,
    /// Provider details.
    pub provider_meta: ProviderMeta,
    /// When the result was written.
    pub timestamp: DateTime<Utc>,
}
