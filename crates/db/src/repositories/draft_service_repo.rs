//! Repository for the `draft_services` table.

use marketplace_core::error::ValidationError;
use marketplace_core::service::{DraftService, DraftServiceRecord};
use marketplace_core::types::DbId;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::service::DraftServiceRow;

/// Column list for the `draft_services` table.
const COLUMNS: &str = "id, service_id, supplier_id, framework_id, lot_id, data, status, \
    created_at, updated_at";

/// Provides persistence for draft services.
pub struct DraftServiceRepo;

impl DraftServiceRepo {
    pub async fn create(pool: &PgPool, draft: &DraftService) -> Result<DraftService, DbError> {
        let query = format!(
            "INSERT INTO draft_services \
                (service_id, supplier_id, framework_id, lot_id, data, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, DraftServiceRow>(&query)
            .bind(draft.service_id())
            .bind(draft.supplier_id())
            .bind(draft.framework_id())
            .bind(draft.lot_id())
            .bind(draft.data())
            .bind(draft.status().as_str())
            .fetch_one(pool)
            .await?;
        Ok(DraftService::from_record(DraftServiceRecord::try_from(row)?))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DraftService>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM draft_services WHERE id = $1");
        let row = sqlx::query_as::<_, DraftServiceRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        row.map(|row| Ok::<_, DbError>(DraftService::from_record(DraftServiceRecord::try_from(row)?)))
            .transpose()
    }

    /// Write back the payload and status.
    pub async fn save(pool: &PgPool, draft: &DraftService) -> Result<DraftService, DbError> {
        let id = draft
            .id()
            .ok_or_else(|| ValidationError::message("Draft service must be created before it is saved"))?;
        let query = format!(
            "UPDATE draft_services SET data = $2, status = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, DraftServiceRow>(&query)
            .bind(id)
            .bind(draft.data())
            .bind(draft.status().as_str())
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::not_found("draft service", id))?;
        Ok(DraftService::from_record(DraftServiceRecord::try_from(row)?))
    }
}
