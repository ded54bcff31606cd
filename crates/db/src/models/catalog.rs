//! Framework and lot rows, assembled into the in-memory catalog.

use marketplace_core::catalog::{Framework, Lot};
use marketplace_core::error::ValidationError;
use marketplace_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `frameworks` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FrameworkRow {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub family: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FrameworkRow {
    /// Build the core framework with its lots in display order.
    pub fn into_framework(self, lots: Vec<Lot>) -> Result<Framework, ValidationError> {
        Ok(Framework {
            id: self.id,
            slug: self.slug,
            name: self.name,
            family: self.family,
            status: self.status.parse()?,
            lots,
        })
    }
}

/// A lot joined through `framework_lots`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FrameworkLotRow {
    pub framework_id: DbId,
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub allows_brief: bool,
    pub one_service_limit: bool,
    pub unit_singular: String,
    pub unit_plural: String,
}

impl From<FrameworkLotRow> for Lot {
    fn from(row: FrameworkLotRow) -> Self {
        Lot {
            id: row.id,
            slug: row.slug,
            name: row.name,
            allows_brief: row.allows_brief,
            one_service_limit: row.one_service_limit,
            unit_singular: row.unit_singular,
            unit_plural: row.unit_plural,
        }
    }
}
