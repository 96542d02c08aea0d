use serde::{Deserialize, Serialize};

/// Tenant scope. Every record key and bulk query is bound to one organization;
/// `admin_role` names the role that administers this tenant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub admin_role: String,
}

impl Organization {
    pub fn new(id: impl Into<String>, admin_role: impl Into<String>) -> Self {
        Self { id: id.into(), admin_role: admin_role.into() }
    }
}
