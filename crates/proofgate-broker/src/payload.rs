//! # Callback Payloads
//!
//! Parses a provider callback body into a [`Callback`]. Parsing is total:
//! a body either yields a complete, typed callback or a
//! [`IngestError::MalformedPayload`], never a partially-filled one.
//!
//! ```json
//! { "type": "present-proof/presentation-result",
//!   "thid": "ndi-999",
//!   "verification_result": "ProofValidated",
//!   "holder_did": "did:…", "relationship_did": "did:…",
//!   "requested_presentation": {
//!     "revealed_attrs": { "Full Name": [ { "value": "Jane Doe" } ] } } }
//! ```
//!
//! | `type`                                    | Parsed as |
//! |-------------------------------------------|-----------|
//! | absent or `present-proof/presentation-result` | [`Callback::Presentation`] |
//! | `issue-credential/*`                      | [`Callback::Credential`] |
//! | anything else                             | [`Callback::Ignored`] |

use std::collections::BTreeMap;

use proofgate_core::ProviderRef;
use serde::Deserialize;

use crate::error::IngestError;
use crate::model::ProviderMeta;

/// Callback type of a presentation result.
pub const PRESENTATION_RESULT: &str = "present-proof/presentation-result";

/// Prefix of every credential-issuance callback type.
pub const CREDENTIAL_PREFIX: &str = "issue-credential/";

/// The provider's verification outcome string for a valid proof.
pub const PROOF_VALIDATED: &str = "ProofValidated";

/// Revealed attribute names of a foundational-ID presentation.
pub mod attr {
    /// Holder's full name.
    pub const FULL_NAME: &str = "Full Name";
    /// Holder's citizen ID number.
    pub const ID_NUMBER: &str = "ID Number";
    /// Organization license number.
    pub const LICENSE_NO: &str = "License No.";
    /// Organization name.
    pub const CFA_NAME: &str = "CFA Name";
    /// Employee's citizen ID number.
    pub const CFA_EMPLOYEE_CID: &str = "CFA Employee CID";
}

#[derive(Debug, Deserialize)]
struct RawCallback {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    thid: Option<String>,
    #[serde(default)]
    verification_result: Option<String>,
    #[serde(default)]
    holder_did: Option<String>,
    #[serde(default)]
    relationship_did: Option<String>,
    #[serde(default)]
    requested_presentation: Option<RawPresentation>,
}

#[derive(Debug, Deserialize)]
struct RawPresentation {
    #[serde(default)]
    revealed_attrs: Option<BTreeMap<String, Vec<RawAttrValue>>>,
}

#[derive(Debug, Deserialize)]
struct RawAttrValue {
    value: serde_json::Value,
}

/// Revealed attributes, first value of each, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealedAttributes(BTreeMap<String, String>);

/// Organization-agent attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAttributes {
    /// Organization license number.
    pub license: String,
    /// Organization name.
    pub org_name: String,
    /// Employee's citizen ID number.
    pub employee_cid: String,
}

impl RevealedAttributes {
    /// The value of one attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Full name and ID number, when both are present.
    pub fn foundational(&self) -> Option<(&str, &str)> {
        Some((self.get(attr::FULL_NAME)?, self.get(attr::ID_NUMBER)?))
    }

    /// Agent attributes, when all three are present.
    pub fn agent(&self) -> Option<AgentAttributes> {
        Some(AgentAttributes {
            license: self.get(attr::LICENSE_NO)?.to_string(),
            org_name: self.get(attr::CFA_NAME)?.to_string(),
            employee_cid: self.get(attr::CFA_EMPLOYEE_CID)?.to_string(),
        })
    }

    /// Best-effort name and identifier for an unregistered payload.
    pub fn raw_name_and_id(&self) -> (String, String) {
        let name = self
            .get(attr::FULL_NAME)
            .or_else(|| self.get(attr::CFA_NAME))
            .unwrap_or_default();
        let id = self
            .get(attr::ID_NUMBER)
            .or_else(|| self.get(attr::CFA_EMPLOYEE_CID))
            .unwrap_or_default();
        (name.to_string(), id.to_string())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for RevealedAttributes {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// A presentation-result callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationCallback {
    /// The provider's thread id.
    pub provider_ref: ProviderRef,
    /// Whether the provider validated the proof.
    pub verified: bool,
    /// Revealed attributes.
    pub revealed: RevealedAttributes,
    /// Provider details.
    pub meta: ProviderMeta,
}

/// A credential-issuance callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCallback {
    /// The provider's thread id.
    pub provider_ref: ProviderRef,
    /// The full callback type, e.g. `issue-credential/credential-accepted`.
    pub event: String,
    /// Accepted, rejected, or `None` for intermediate events.
    pub accepted: Option<bool>,
    /// Provider details.
    pub meta: ProviderMeta,
}

/// A parsed provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Proof presentation result.
    Presentation(PresentationCallback),
    /// Credential issuance event.
    Credential(CredentialCallback),
    /// A type we do not act on.
    Ignored {
        /// The callback type.
        kind: String,
    },
}

impl Callback {
    /// Parse a callback body.
    pub fn parse(body: &serde_json::Value) -> Result<Self, IngestError> {
        match body {
            serde_json::Value::Object(map) if !map.is_empty() => {}
            _ => {
                return Err(IngestError::MalformedPayload(
                    "body must be a non-empty JSON object".into(),
                ))
            }
        }
        let raw = RawCallback::deserialize(body)
            .map_err(|e| IngestError::MalformedPayload(e.to_string()))?;

        match raw.kind.as_deref() {
            None | Some(PRESENTATION_RESULT) => parse_presentation(raw).map(Self::Presentation),
            Some(kind) if kind.starts_with(CREDENTIAL_PREFIX) => {
                parse_credential(raw).map(Self::Credential)
            }
            Some(kind) => Ok(Self::Ignored {
                kind: kind.to_string(),
            }),
        }
    }
}

fn required_ref(thid: Option<String>) -> Result<ProviderRef, IngestError> {
    let thid = thid.ok_or_else(|| IngestError::MalformedPayload("missing thid".into()))?;
    ProviderRef::new(thid).map_err(|e| IngestError::MalformedPayload(e.to_string()))
}

fn attr_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn parse_presentation(raw: RawCallback) -> Result<PresentationCallback, IngestError> {
    let provider_ref = required_ref(raw.thid)?;
    let verification_result = raw
        .verification_result
        .ok_or_else(|| IngestError::MalformedPayload("missing verification_result".into()))?;
    let attrs = raw
        .requested_presentation
        .and_then(|p| p.revealed_attrs)
        .ok_or_else(|| {
            IngestError::MalformedPayload("missing requested_presentation.revealed_attrs".into())
        })?;

    let revealed = RevealedAttributes(
        attrs
            .into_iter()
            .filter_map(|(name, values)| {
                values
                    .into_iter()
                    .next()
                    .map(|v| (name, attr_text(v.value).trim().to_string()))
            })
            .collect(),
    );

    let verified = verification_result == PROOF_VALIDATED;
    if verified && revealed.agent().is_none() && revealed.foundational().is_none() {
        return Err(IngestError::MalformedPayload(format!(
            "revealed attributes must include {:?} and {:?}, or the agent attributes",
            attr::FULL_NAME,
            attr::ID_NUMBER
        )));
    }

    Ok(PresentationCallback {
        provider_ref,
        verified,
        revealed,
        meta: ProviderMeta {
            verification_result: Some(verification_result),
            holder_did: raw.holder_did,
            relationship_did: raw.relationship_did,
        },
    })
}

fn parse_credential(raw: RawCallback) -> Result<CredentialCallback, IngestError> {
    let provider_ref = required_ref(raw.thid)?;
    let event = raw.kind.unwrap_or_default();
    let accepted = match event.trim_start_matches(CREDENTIAL_PREFIX) {
        "credential-accepted" => Some(true),
        "credential-rejected" | "problem-report" => Some(false),
        _ => None,
    };
    Ok(CredentialCallback {
        provider_ref,
        event,
        accepted,
        meta: ProviderMeta {
            verification_result: raw.verification_result,
            holder_did: raw.holder_did,
            relationship_did: raw.relationship_did,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn presentation(attrs: serde_json::Value) -> serde_json::Value {
        json!({
            "type": PRESENTATION_RESULT,
            "thid": "ndi-999",
            "verification_result": "ProofValidated",
            "holder_did": "did:key:h",
            "requested_presentation": { "revealed_attrs": attrs }
        })
    }

    #[test]
    fn parses_foundational_presentation() {
        let body = presentation(json!({
            "Full Name": [{ "value": "Jane Doe" }],
            "ID Number": [{ "value": "10987654321" }]
        }));
        let Callback::Presentation(p) = Callback::parse(&body).unwrap() else {
            panic!("expected presentation");
        };
        assert_eq!(p.provider_ref.as_str(), "ndi-999");
        assert!(p.verified);
        assert_eq!(p.revealed.foundational(), Some(("Jane Doe", "10987654321")));
        assert_eq!(p.meta.holder_did.as_deref(), Some("did:key:h"));
    }

    #[test]
    fn numeric_attribute_values_become_text() {
        let body = presentation(json!({
            "Full Name": [{ "value": "Jane Doe" }],
            "ID Number": [{ "value": 10987654321u64 }]
        }));
        let Callback::Presentation(p) = Callback::parse(&body).unwrap() else {
            panic!("expected presentation");
        };
        assert_eq!(p.revealed.get(attr::ID_NUMBER), Some("10987654321"));
    }

    #[test]
    fn missing_type_is_a_presentation() {
        let mut body = presentation(json!({
            "Full Name": [{ "value": "A" }],
            "ID Number": [{ "value": "1" }]
        }));
        body.as_object_mut().unwrap().remove("type");
        assert!(matches!(Callback::parse(&body).unwrap(), Callback::Presentation(_)));
    }

    #[test]
    fn parses_agent_presentation() {
        let body = presentation(json!({
            "License No.": [{ "value": "CFA-001" }],
            "CFA Name": [{ "value": "Druk Forwarders" }],
            "CFA Employee CID": [{ "value": "11111111111" }]
        }));
        let Callback::Presentation(p) = Callback::parse(&body).unwrap() else {
            panic!("expected presentation");
        };
        let agent = p.revealed.agent().unwrap();
        assert_eq!(agent.license, "CFA-001");
        assert_eq!(agent.employee_cid, "11111111111");
    }

    #[test]
    fn empty_body_is_malformed() {
        assert!(matches!(
            Callback::parse(&json!({})),
            Err(IngestError::MalformedPayload(_))
        ));
        assert!(matches!(
            Callback::parse(&json!([1, 2])),
            Err(IngestError::MalformedPayload(_))
        ));
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        let no_thid = json!({
            "verification_result": "ProofValidated",
            "requested_presentation": { "revealed_attrs": {} }
        });
        assert!(Callback::parse(&no_thid).is_err());

        let no_outcome = json!({
            "thid": "x",
            "requested_presentation": { "revealed_attrs": {} }
        });
        assert!(Callback::parse(&no_outcome).is_err());

        let no_attrs = json!({ "thid": "x", "verification_result": "ProofValidated" });
        assert!(Callback::parse(&no_attrs).is_err());
    }

    #[test]
    fn validated_proof_without_identity_attributes_is_malformed() {
        let body = presentation(json!({ "Full Name": [{ "value": "Only Name" }] }));
        assert!(matches!(
            Callback::parse(&body),
            Err(IngestError::MalformedPayload(_))
        ));
    }

    #[test]
    fn unvalidated_proof_may_lack_identity_attributes() {
        let mut body = presentation(json!({}));
        body["verification_result"] = json!("ProofInvalid");
        let Callback::Presentation(p) = Callback::parse(&body).unwrap() else {
            panic!("expected presentation");
        };
        assert!(!p.verified);
        assert_eq!(p.revealed.raw_name_and_id(), (String::new(), String::new()));
    }

    #[test]
    fn credential_events_map_to_acceptance() {
        let accepted = json!({ "type": "issue-credential/credential-accepted", "thid": "c-1" });
        let rejected = json!({ "type": "issue-credential/problem-report", "thid": "c-1" });
        let offered = json!({ "type": "issue-credential/offer-sent", "thid": "c-1" });

        let Callback::Credential(a) = Callback::parse(&accepted).unwrap() else { panic!() };
        let Callback::Credential(r) = Callback::parse(&rejected).unwrap() else { panic!() };
        let Callback::Credential(o) = Callback::parse(&offered).unwrap() else { panic!() };
        assert_eq!(a.accepted, Some(true));
        assert_eq!(r.accepted, Some(false));
        assert_eq!(o.accepted, None);
    }

    #[test]
    fn other_types_are_ignored() {
        let body = json!({ "type": "connections/established", "thid": "z" });
        assert_eq!(
            Callback::parse(&body).unwrap(),
            Callback::Ignored {
                kind: "connections/established".into()
            }
        );
    }
}
