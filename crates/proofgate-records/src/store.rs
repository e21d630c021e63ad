//! The `RecordStore` trait.

use async_trait::async_trait;

use crate::error::RecordStoreError;
use crate::models::{BusinessOwner, OrgEmployeeMatch, Organization};

/// Read-only identity lookups consumed by the identity classifier.
///
/// Implementations must be `Send + Sync` so one store can be shared across
/// request handlers behind an `Arc`. The trait is object-safe so the backend
/// can be chosen at startup.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find an employee, in any organization, whose name and citizen ID both
    /// match.
    async fn find_org_employee_by_name_and_id(
        &self,
        name: &str,
        id: &str,
    ) -> Result<Option<OrgEmployeeMatch>, RecordStoreError>;

    /// Find a business owner whose registered name and citizen ID both match.
    async fn find_owner_by_credentials(
        &self,
        name: &str,
        id: &str,
    ) -> Result<Option<BusinessOwner>, RecordStoreError>;

    /// Find an organization by license number and registered name.
    async fn find_org_by_license_and_name(
        &self,
        license: &str,
        name: &str,
    ) -> Result<Option<Organization>, RecordStoreError>;

    /// Human-readable backend name, for startup logging.
    fn backend_name(&self) -> &str;
}
