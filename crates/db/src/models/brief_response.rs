//! Brief response rows.

use marketplace_core::brief_response::{BriefResponseRecord, BriefResponseStatus};
use marketplace_core::types::{DbId, SupplierId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `brief_responses` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BriefResponseRow {
    pub id: DbId,
    pub brief_id: DbId,
    pub supplier_id: SupplierId,
    pub data: serde_json::Value,
    pub award_details: serde_json::Value,
    pub submitted_at: Option<Timestamp>,
    pub awarded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<BriefResponseRow> for BriefResponseRecord {
    fn from(row: BriefResponseRow) -> Self {
        BriefResponseRecord {
            id: row.id,
            brief_id: row.brief_id,
            supplier_id: row.supplier_id,
            data: row.data,
            award_details: row.award_details,
            submitted_at: row.submitted_at,
            awarded_at: row.awarded_at,
            created_at: row.created_at,
        }
    }
}

/// Filters for listing brief responses.
#[derive(Debug, Clone, Default)]
pub struct BriefResponseFilter {
    pub brief_id: Option<DbId>,
    pub supplier_id: Option<SupplierId>,
    pub statuses: Vec<BriefResponseStatus>,
}

impl BriefResponseFilter {
    pub fn status_strings(&self) -> Vec<String> {
        self.statuses.iter().map(|s| s.as_str().to_string()).collect()
    }
}

/// Supplier name and declared organisation size for one framework.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierSummaryRow {
    pub name: String,
    pub organisation_size: Option<String>,
}
