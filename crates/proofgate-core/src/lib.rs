#![deny(missing_docs)]

//! # proofgate-core: Foundational Types for proofgate
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies and performs no I/O.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A [`RequestHandle`] (our id, the
//!    only one a client ever sees) cannot be passed where a [`ProviderRef`]
//!    (the verification provider's id for the same request) is expected.
//!
//! 2. **Handles come from one place.** [`HandleGenerator`] is the sole
//!    producer of fresh handles; clients can only parse handles back.
//!
//! 3. **Time is injected.** Expiry logic reads time through the [`Clock`]
//!    trait so that TTL behavior is testable with [`ManualClock`].

pub mod error;
pub mod identity;
pub mod kind;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{HandleGenerator, ProviderRef, RequestHandle, SessionToken};
pub use kind::ProofKind;
pub use temporal::{Clock, ManualClock, SharedClock, SystemClock};
