//! User rows.

use marketplace_core::types::{DbId, Timestamp};
use marketplace_core::user::User;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub email_address: String,
    pub name: String,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email_address: row.email_address,
            name: row.name,
            role: row.role,
        }
    }
}

/// A user attached to a brief through `brief_users`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BriefUserRow {
    pub brief_id: DbId,
    pub id: DbId,
    pub email_address: String,
    pub name: String,
    pub role: String,
}

impl From<BriefUserRow> for User {
    fn from(row: BriefUserRow) -> Self {
        User {
            id: row.id,
            email_address: row.email_address,
            name: row.name,
            role: row.role,
        }
    }
}

/// Input for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email_address: String,
    pub name: String,
    pub role: String,
}
