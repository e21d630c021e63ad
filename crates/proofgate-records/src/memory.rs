//! In-memory Record Store.
//!
//! Used by tests and when the service starts without `DATABASE_URL`.
//! Records can be seeded at any time; an outage can be simulated with
//! [`InMemoryRecordStore::set_unavailable`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::RecordStoreError;
use crate::models::{BusinessOwner, OrgEmployeeMatch, Organization};
use crate::store::RecordStore;

#[derive(Debug, Default)]
struct Inner {
    /// Keyed by business license.
    owners: HashMap<String, BusinessOwner>,
    /// Keyed by organization license.
    orgs: HashMap<String, Organization>,
    outage: Option<String>,
}

/// Thread-safe in-memory Record Store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a business owner.
    pub fn insert_owner(&self, owner: BusinessOwner) {
        self.inner
            .write()
            .owners
            .insert(owner.business_license.clone(), owner);
    }

    /// Insert or replace an organization.
    pub fn insert_org(&self, org: Organization) {
        self.inner.write().orgs.insert(org.license.clone(), org);
    }

    /// Make every subsequent lookup fail with `reason`, or restore service
    /// with `None`.
    pub fn set_unavailable(&self, reason: Option<String>) {
        self.inner.write().outage = reason;
    }

    fn check_available(inner: &Inner) -> Result<(), RecordStoreError> {
        match &inner.outage {
            Some(reason) => Err(RecordStoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_org_employee_by_name_and_id(
        &self,
        name: &str,
        id: &str,
    ) -> Result<Option<OrgEmployeeMatch>, RecordStoreError> {
        let inner = self.inner.read();
        Self::check_available(&inner)?;
        Ok(inner.orgs.values().find_map(|org| {
            org.employee_by_name_and_cid(name, id)
                .map(|e| OrgEmployeeMatch::new(org, e))
        }))
    }

    async fn find_owner_by_credentials(
        &self,
        name: &str,
        id: &str,
    ) -> Result<Option<BusinessOwner>, RecordStoreError> {
        let inner = self.inner.read();
        Self::check_available(&inner)?;
        Ok(inner
            .owners
            .values()
            .find(|o| o.cid == id && o.name == name)
            .cloned())
    }

    async fn find_org_by_license_and_name(
        &self,
        license: &str,
        name: &str,
    ) -> Result<Option<Organization>, RecordStoreError> {
        let inner = self.inner.read();
        Self::check_available(&inner)?;
        Ok(inner
            .orgs
            .get(license)
            .filter(|o| o.name == name)
            .cloned())
    }

    fn backend_name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Employee;

    fn seeded() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        store.insert_owner(BusinessOwner {
            business_license: "BL-100".into(),
            username: "jdoe".into(),
            name: "Jane Doe".into(),
            cid: "10987654321".into(),
        });
        store.insert_org(Organization {
            license: "CFA-001".into(),
            name: "Druk Forwarders".into(),
            employees: vec![Employee {
                cid: "11111111111".into(),
                name: "Pema Wangmo".into(),
                employee_id: Some("E-7".into()),
            }],
        });
        store
    }

    #[tokio::test]
    async fn owner_lookup_matches_name_and_cid() {
        let store = seeded();
        let found = store
            .find_owner_by_credentials("Jane Doe", "10987654321")
            .await
            .unwrap();
        assert_eq!(found.unwrap().username, "jdoe");

        let wrong_name = store
            .find_owner_by_credentials("John Doe", "10987654321")
            .await
            .unwrap();
        assert!(wrong_name.is_none());
    }

    #[tokio::test]
    async fn employee_lookup_returns_org_context() {
        let store = seeded();
        let found = store
            .find_org_employee_by_name_and_id("Pema Wangmo", "11111111111")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.org_license, "CFA-001");
        assert_eq!(found.org_name, "Druk Forwarders");
        assert_eq!(found.employee.employee_id.as_deref(), Some("E-7"));
    }

    #[tokio::test]
    async fn org_lookup_requires_matching_name() {
        let store = seeded();
        assert!(store
            .find_org_by_license_and_name("CFA-001", "Druk Forwarders")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_org_by_license_and_name("CFA-001", "Other Name")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn outage_fails_every_lookup() {
        let store = seeded();
        store.set_unavailable(Some("maintenance".into()));
        let err = store
            .find_owner_by_credentials("Jane Doe", "10987654321")
            .await
            .unwrap_err();
        assert!(matches!(err, RecordStoreError::Unavailable(_)));

        store.set_unavailable(None);
        assert!(store
            .find_owner_by_credentials("Jane Doe", "10987654321")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn clones_share_data() {
        let store = InMemoryRecordStore::new();
        let clone = store.clone();
        clone.insert_owner(BusinessOwner {
            business_license: "BL-2".into(),
            username: "u".into(),
            name: "N".into(),
            cid: "1".into(),
        });
        assert!(store.find_owner_by_credentials("N", "1").await.unwrap().is_some());
    }
}
