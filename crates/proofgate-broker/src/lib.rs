//! # proofgate-broker: Verification Correlation and Result Cache
//!
//! A client asks for a proof; the provider answers minutes later (or never)
//! through a webhook that only knows the provider's own thread id. This
//! crate bridges the two:
//!
//! ```text
//! create_request ─► provider dispatch ─► CorrelationTable.record ─► PendingRegistry.mark
//!                                                                         │
//! provider callback ─► parse ─► resolve (reverse index) ─► DedupLedger.claim
//!                           ─► IdentityClassifier ─► ResultCache.put ─► PendingRegistry.clear
//!
//! poll ─► ResultCache ─► PendingRegistry ─► not found
//! reaper (periodic) ─► PendingRegistry.sweep + DedupLedger.sweep
//! ```
//!
//! Each table is an owned component guarded by its own `parking_lot` lock
//! and exposes only atomic operations. [`VerificationBroker`] ties them
//! together; the HTTP layer talks to nothing else.

pub mod broker;
pub mod classifier;
pub mod correlation;
pub mod dedup;
pub mod error;
pub mod model;
pub mod payload;
pub mod pending;
pub mod provider;
pub mod reaper;
pub mod results;
pub mod stats;

pub use broker::{
    BrokerConfig, CreatedCredential, CreatedRequest, IngestOutcome, PollStatus,
    VerificationBroker,
};
pub use error::{BrokerError, IngestError};
pub use model::{CredentialResult, Outcome, ProviderMeta, SubjectKind, SubjectPayload, VerificationResult};
pub use provider::{
    CredentialDispatch, CredentialOffer, ProviderDispatch, ProviderError, ScriptedProvider,
    VerificationProvider,
};
pub use reaper::{spawn_reaper, SweepReport};
pub use stats::StatsSnapshot;
