//! Service, archived service and draft service rows.

use marketplace_core::error::ValidationError;
use marketplace_core::service::{DraftServiceRecord, ServiceRecord, ServiceStatus};
use marketplace_core::types::{DbId, SupplierId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `services` or `archived_services` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceRow {
    pub id: DbId,
    pub service_id: String,
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub lot_id: DbId,
    pub data: serde_json::Value,
    pub status: String,
    pub updated_by: String,
    pub updated_reason: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ServiceRow> for ServiceRecord {
    type Error = ValidationError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Ok(ServiceRecord {
            id: row.id,
            service_id: row.service_id,
            supplier_id: row.supplier_id,
            framework_id: row.framework_id,
            lot_id: row.lot_id,
            data: row.data,
            status: row.status.parse()?,
            updated_by: row.updated_by,
            updated_reason: row.updated_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Filters for listing services.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    /// Only services on a framework whose status is `live`.
    pub framework_is_live: bool,
    pub statuses: Vec<ServiceStatus>,
    pub supplier_id: Option<SupplierId>,
    pub lot_slug: Option<String>,
    /// The data payload has this top-level key.
    pub data_has_key: Option<String>,
    /// The array stored under `.0` in the data payload contains `.1`.
    pub data_key_contains_value: Option<(String, String)>,
}

/// A row from the `draft_services` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DraftServiceRow {
    pub id: DbId,
    pub service_id: Option<String>,
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub lot_id: DbId,
    pub data: serde_json::Value,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<DraftServiceRow> for DraftServiceRecord {
    type Error = ValidationError;

    fn try_from(row: DraftServiceRow) -> Result<Self, Self::Error> {
        Ok(DraftServiceRecord {
            id: row.id,
            service_id: row.service_id,
            supplier_id: row.supplier_id,
            framework_id: row.framework_id,
            lot_id: row.lot_id,
            data: row.data,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
