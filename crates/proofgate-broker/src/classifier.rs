//! # Identity Classifier
//!
//! Decides which local identity category a presentation belongs to.
//!
//! ## Foundational-ID presentations
//!
//! The owner lookup and the employee lookup are issued concurrently and both
//! are awaited before precedence is applied: **Owner > OrgEmployee >
//! Unregistered**. No lock on broker state is held while they run.
//!
//! ## Agent presentations
//!
//! The organization is looked up by license and name, then the employee by
//! citizen ID within it.
//!
//! ## Failures
//!
//! "Not found" is the `Unregistered` branch, not an error. A Record Store
//! error becomes an `Error` verdict with `failed = true`, so the poller gets
//! a definitive answer.

use std::sync::Arc;

use proofgate_core::SessionToken;
use proofgate_records::{RecordStore, RecordStoreError};

use crate::model::{Outcome, SubjectPayload};
use crate::payload::{AgentAttributes, PresentationCallback};

/// Message for a foundational presentation with no matching record.
pub const NOT_REGISTERED_USER: &str = "Not a registered user";

/// Message for an agent presentation with no matching organization/employee.
pub const NOT_REGISTERED_AGENT: &str = "Not a registered CFA agent";

/// Message for a presentation the provider did not validate.
pub const PROOF_NOT_VALIDATED: &str = "proof not validated";

/// The classifier's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Success for a registered subject, Error otherwise.
    pub outcome: Outcome,
    /// Classified subject.
    pub subject: SubjectPayload,
    /// Diagnostic for error outcomes.
    pub message: Option<String>,
    /// Whether the Record Store failed.
    pub failed: bool,
}

impl Verdict {
    fn matched(subject: SubjectPayload) -> Self {
        Self {
            outcome: Outcome::Success,
            subject,
            message: None,
            failed: false,
        }
    }

    fn unregistered(name: String, id: String, message: &str) -> Self {
        Self {
            outcome: Outcome::Error,
            subject: SubjectPayload::Unregistered { name, id },
            message: Some(message.to_string()),
            failed: false,
        }
    }

    fn failure(name: String, id: String, err: &RecordStoreError) -> Self {
        Self {
            outcome: Outcome::Error,
            subject: SubjectPayload::Unregistered { name, id },
            message: Some(format!("classification failed: {err}")),
            failed: true,
        }
    }
}

/// Classifies presentations against a Record Store.
#[derive(Clone)]
pub struct IdentityClassifier {
    store: Arc<dyn RecordStore>,
}

impl std::fmt::Debug for IdentityClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClassifier")
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl IdentityClassifier {
    /// Create a classifier over `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Classify a presentation. Never fails.
    pub async fn classify(&self, presentation: &PresentationCallback) -> Verdict {
        let revealed = &presentation.revealed;
        if !presentation.verified {
            let (name, id) = revealed.raw_name_and_id();
            return Verdict::unregistered(name, id, PROOF_NOT_VALIDATED);
        }
        if let Some(agent) = revealed.agent() {
            return self.classify_agent(agent).await;
        }
        match revealed.foundational() {
            Some((name, id)) => self.classify_foundational(name, id).await,
            // Unreachable for payloads built by `Callback::parse`.
            None => {
                let (name, id) = revealed.raw_name_and_id();
                Verdict::unregistered(name, id, NOT_REGISTERED_USER)
            }
        }
    }

    async fn classify_foundational(&self, name: &str, id: &str) -> Verdict {
        tracing::debug!(subject_id = %crate::broker::mask(id), "classifying foundational presentation");
        let (owner, employee) = tokio::join!(
            self.store.find_owner_by_credentials(name, id),
            self.store.find_org_employee_by_name_and_id(name, id),
        );

        match owner {
            Ok(Some(owner)) => {
                return Verdict::matched(SubjectPayload::Owner {
                    name: owner.name,
                    id: owner.cid,
                    username: owner.username,
                    business_license: owner.business_license,
                    token: SessionToken::generate(),
                })
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "owner lookup failed");
                return Verdict::failure(name.to_string(), id.to_string(), &e);
            }
        }

        match employee {
            Ok(Some(m)) => Verdict::matched(SubjectPayload::OrgEmployee {
                name: m.employee.name,
                id: m.employee.cid,
                org_license: m.org_license,
                org_name: m.org_name,
                employee_id: m.employee.employee_id,
            }),
            Ok(None) => Verdict::unregistered(name.to_string(), id.to_string(), NOT_REGISTERED_USER),
            Err(e) => {
                tracing::error!(error = %e, "employee lookup failed");
                Verdict::failure(name.to_string(), id.to_string(), &e)
            }
        }
    }

    async fn classify_agent(&self, agent: AgentAttributes) -> Verdict {
        tracing::debug!(
            org_license = %agent.license,
            employee_cid = %crate::broker::mask(&agent.employee_cid),
            "classifying agent presentation"
        );
        let org = match self
            .store
            .find_org_by_license_and_name(&agent.license, &agent.org_name)
            .await
        {
            Ok(org) => org,
            Err(e) => {
                tracing::error!(error = %e, "organization lookup failed");
                return Verdict::failure(agent.org_name, agent.employee_cid, &e);
            }
        };

        let matched = org.as_ref().and_then(|org| {
            org.employee_by_cid(&agent.employee_cid)
                .map(|e| (org, e.clone()))
        });
        match matched {
            Some((org, employee)) => Verdict::matched(SubjectPayload::OrgEmployee {
                name: employee.name,
                id: employee.cid,
                org_license: org.license.clone(),
                org_name: org.name.clone(),
                employee_id: employee.employee_id,
            }),
            None => Verdict::unregistered(agent.org_name, agent.employee_cid, NOT_REGISTERED_AGENT),
        }
    }
}
