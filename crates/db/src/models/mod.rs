//! Database row structs and query filters.
//!
//! Each submodule contains:
//! - `FromRow` structs matching the database rows
//! - conversions from rows into `marketplace_core` entities
//! - filter structs for list queries (empty vectors and `None` match everything)
//!
//! Writes take the core entities themselves, after their guards have run.

pub mod brief;
pub mod brief_response;
pub mod catalog;
pub mod service;
pub mod supplier;
pub mod supplier_framework;
pub mod user;

use marketplace_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row id paired with the status derived for it in SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DerivedStatusRow {
    pub id: DbId,
    pub status: String,
}

/// Number of rows per derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}
