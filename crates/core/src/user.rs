//! Marketplace user accounts, as far as briefs are concerned.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::DbId;

pub const ROLE_BUYER: &str = "buyer";
pub const ROLE_SUPPLIER: &str = "supplier";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_ADMIN_CCS_CATEGORY: &str = "admin-ccs-category";
pub const ROLE_ADMIN_CCS_SOURCING: &str = "admin-ccs-sourcing";

/// All valid role values.
pub const VALID_ROLES: &[&str] = &[
    ROLE_BUYER,
    ROLE_SUPPLIER,
    ROLE_ADMIN,
    ROLE_ADMIN_CCS_CATEGORY,
    ROLE_ADMIN_CCS_SOURCING,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: DbId,
    pub email_address: String,
    pub name: String,
    pub role: String,
}

impl User {
    pub fn is_buyer(&self) -> bool {
        self.role == ROLE_BUYER
    }

    /// Summary used when a user is embedded in another entity.
    pub fn serialize_summary(&self) -> Value {
        json!({
            "id": self.id,
            "emailAddress": self.email_address,
            "name": self.name,
            "role": self.role,
        })
    }
}
