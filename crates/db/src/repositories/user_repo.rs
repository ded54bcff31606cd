//! Repository for the `users` table.

use marketplace_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UserRow};

/// Column list for the `users` table.
const COLUMNS: &str = "id, email_address, name, role, created_at, updated_at";

/// Provides create and lookup operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user. Unknown roles are refused by the table's check constraint.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<UserRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email_address, name, role) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(&input.email_address)
            .bind(&input.name)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email_address: &str) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email_address) = lower($1)");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(email_address)
            .fetch_optional(pool)
            .await
    }
}
