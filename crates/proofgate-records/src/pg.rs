//! Postgres Record Store.
//!
//! Reads the existing registration tables:
//!
//! - `business_owner(business_license, username, name, cid)`
//! - `cfa(cfa_license, cfa_name, employee_details jsonb)` where
//!   `employee_details` is an array of `{cid, name, employee_id}`.
//!
//! Queries are runtime-checked (`sqlx::query_as`), so the crate builds
//! without a live database. This store never writes.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::RecordStoreError;
use crate::models::{BusinessOwner, Employee, OrgEmployeeMatch, Organization};
use crate::store::RecordStore;

/// Record Store backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OwnerRow {
    business_license: String,
    username: String,
    name: String,
    cid: String,
}

impl From<OwnerRow> for BusinessOwner {
    fn from(row: OwnerRow) -> Self {
        Self {
            business_license: row.business_license,
            username: row.username,
            name: row.name,
            cid: row.cid,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CfaRow {
    cfa_license: String,
    cfa_name: String,
    employee_details: Option<serde_json::Value>,
}

impl CfaRow {
    fn into_org(self) -> Result<Organization, RecordStoreError> {
        Ok(Organization {
            employees: decode_employees(self.employee_details)?,
            license: self.cfa_license,
            name: self.cfa_name,
        })
    }
}

/// Decode the `employee_details` column. `NULL` means no employees.
fn decode_employees(raw: Option<serde_json::Value>) -> Result<Vec<Employee>, RecordStoreError> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(|e| RecordStoreError::Decode {
            table: "cfa",
            reason: format!("employee_details: {e}"),
        }),
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_org_employee_by_name_and_id(
        &self,
        name: &str,
        id: &str,
    ) -> Result<Option<OrgEmployeeMatch>, RecordStoreError> {
        let needle = serde_json::json!([{ "cid": id, "name": name }]);
        let row = sqlx::query_as::<_, CfaRow>(
            "SELECT cfa_license, cfa_name, employee_details
             FROM cfa WHERE employee_details @> $1 LIMIT 1",
        )
        .bind(&needle)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let org = row.into_org()?;
        Ok(org
            .employee_by_name_and_cid(name, id)
            .map(|e| OrgEmployeeMatch::new(&org, e)))
    }

    async fn find_owner_by_credentials(
        &self,
        name: &str,
        id: &str,
    ) -> Result<Option<BusinessOwner>, RecordStoreError> {
        let row = sqlx::query_as::<_, OwnerRow>(
            "SELECT business_license, username, name, cid
             FROM business_owner WHERE cid = $1 AND name = $2 LIMIT 1",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BusinessOwner::from))
    }

    async fn find_org_by_license_and_name(
        &self,
        license: &str,
        name: &str,
    ) -> Result<Option<Organization>, RecordStoreError> {
        let row = sqlx::query_as::<_, CfaRow>(
            "SELECT cfa_license, cfa_name, employee_details
             FROM cfa WHERE cfa_license = $1 AND cfa_name = $2",
        )
        .bind(license)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CfaRow::into_org).transpose()
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_employee_details_is_empty() {
        assert!(decode_employees(None).unwrap().is_empty());
        assert!(decode_employees(Some(serde_json::Value::Null))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn employee_details_array_decodes() {
        let raw = serde_json::json!([
            { "cid": "11111111111", "name": "Pema Wangmo", "employee_id": "E-7" },
            { "cid": "22222222222", "name": "Karma Dorji" }
        ]);
        let employees = decode_employees(Some(raw)).unwrap();
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[1].employee_id, None);
    }

    #[test]
    fn malformed_employee_details_is_a_decode_error() {
        let raw = serde_json::json!({ "not": "an array" });
        let err = decode_employees(Some(raw)).unwrap_err();
        assert!(matches!(err, RecordStoreError::Decode { table: "cfa", .. }));
    }
}
