//! # Validation Errors
//!
//! Errors raised when constructing identifier newtypes from untrusted input.

use thiserror::Error;

/// Validation failure for a domain identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The value is not a well-formed request handle.
    #[error("invalid request handle: {0}")]
    InvalidHandle(String),

    /// The provider reference is empty or too long.
    #[error("invalid provider reference: {0}")]
    InvalidProviderRef(String),

    /// The requested proof kind is not one the service can issue.
    #[error("unknown proof kind: {0:?} (expected \"normal\" or \"agent\")")]
    UnknownProofKind(String),
}
