//! # proofgate-records: Record Store
//!
//! Read-only lookups against the locally registered identities that a
//! verified presentation is classified against:
//!
//! - **Business owners**: registered by business license, matched on the
//!   holder's full name and citizen ID.
//! - **Organizations** (CFAs): registered by license and name, each with a
//!   list of employees identified by citizen ID.
//!
//! The broker only sees the [`RecordStore`] trait. Two backends implement it:
//! [`InMemoryRecordStore`] for tests and database-less development, and
//! [`PgRecordStore`] for the existing Postgres tables.

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod store;

pub use error::RecordStoreError;
pub use memory::InMemoryRecordStore;
pub use models::{BusinessOwner, Employee, OrgEmployeeMatch, Organization};
pub use pg::PgRecordStore;
pub use store::RecordStore;
