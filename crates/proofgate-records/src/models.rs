//! Record types returned by the Record Store.

use serde::{Deserialize, Serialize};

/// A registered business owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessOwner {
    /// Business license number; the owner's primary key.
    pub business_license: String,
    /// Login username.
    pub username: String,
    /// Registered full name.
    pub name: String,
    /// Citizen ID number.
    pub cid: String,
}

/// An employee entry inside an organization's `employee_details` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Citizen ID number.
    pub cid: String,
    /// Full name.
    pub name: String,
    /// Organization-assigned employee number, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
}

/// A registered organization (clearing and forwarding agent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization license number.
    pub license: String,
    /// Registered organization name.
    pub name: String,
    /// Employees registered under the organization.
    #[serde(default)]
    pub employees: Vec<Employee>,
}

impl Organization {
    /// Find an employee by citizen ID.
    pub fn employee_by_cid(&self, cid: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.cid == cid)
    }

    /// Find an employee matching both name and citizen ID.
    pub fn employee_by_name_and_cid(&self, name: &str, cid: &str) -> Option<&Employee> {
        self.employees
            .iter()
            .find(|e| e.cid == cid && e.name == name)
    }
}

/// An employee together with the organization that employs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgEmployeeMatch {
    /// Employing organization's license number.
    pub org_license: String,
    /// Employing organization's name.
    pub org_name: String,
    /// The matched employee.
    pub employee: Employee,
}

impl OrgEmployeeMatch {
    /// Pair an organization with one of its employees.
    pub fn new(org: &Organization, employee: &Employee) -> Self {
        Self {
            org_license: org.license.clone(),
            org_name: org.name.clone(),
            employee: employee.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> Organization {
        Organization {
            license: "CFA-001".into(),
            name: "Druk Forwarders".into(),
            employees: vec![
                Employee {
                    cid: "11111111111".into(),
                    name: "Pema Wangmo".into(),
                    employee_id: Some("E-7".into()),
                },
                Employee {
                    cid: "22222222222".into(),
                    name: "Karma Dorji".into(),
                    employee_id: None,
                },
            ],
        }
    }

    #[test]
    fn employee_lookup_by_cid() {
        let o = org();
        assert_eq!(o.employee_by_cid("22222222222").unwrap().name, "Karma Dorji");
        assert!(o.employee_by_cid("33333333333").is_none());
    }

    #[test]
    fn employee_lookup_requires_both_name_and_cid() {
        let o = org();
        assert!(o.employee_by_name_and_cid("Pema Wangmo", "11111111111").is_some());
        assert!(o.employee_by_name_and_cid("Pema Wangmo", "22222222222").is_none());
    }

    #[test]
    fn employee_details_decode_without_employee_id() {
        let e: Employee =
            serde_json::from_str(r#"{"cid":"1","name":"A"}"#).unwrap();
        assert_eq!(e.employee_id, None);
    }
}
