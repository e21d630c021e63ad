//! # Broker Errors
//!
//! Two families, matching the two entry points:
//!
//! - [`BrokerError`]: request creation. Surfaced synchronously; no
//!   correlation state survives a failed creation.
//! - [`IngestError`]: callback ingestion. Both variants are rejections with
//!   no state change, so the provider may retry.
//!
//! A duplicate callback is not an error (it is acknowledged), and a failed
//! identity classification is not an error either (it becomes a terminal
//! `Error` result).

use proofgate_core::RequestHandle;
use thiserror::Error;

use crate::provider::ProviderError;

/// Failure creating a verification or credential request.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The provider rejected or could not receive the request.
    #[error("verification provider dispatch failed: {0}")]
    ProviderDispatchFailure(#[from] ProviderError),

    /// The generated handle already has a correlation entry.
    #[error("handle {0} is already correlated")]
    DuplicateHandle(RequestHandle),

    /// The provider returned a reference that is already correlated with
    /// another handle.
    #[error("provider reference {0} is already correlated")]
    DuplicateProviderRef(String),

    /// The request itself is unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Rejection of an incoming provider callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Required fields are missing or have the wrong shape.
    #[error("malformed callback payload: {0}")]
    MalformedPayload(String),

    /// The callback's provider reference is not one this process dispatched,
    /// or it refers to a request of a different kind.
    #[error("no correlation for provider reference {0}")]
    UnknownCorrelation(String),
}
