//! Repository for the `frameworks`, `lots` and `framework_lots` tables.

use std::collections::HashMap;

use marketplace_core::catalog::{Catalog, Lot};
use marketplace_core::service::DraftServiceStatus;
use marketplace_core::types::{DbId, SupplierId};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::catalog::{FrameworkLotRow, FrameworkRow};

/// Column list for the `frameworks` table.
const COLUMNS: &str = "id, slug, name, family, status, created_at, updated_at";

/// Lot columns joined through `framework_lots fl`.
const LOT_COLUMNS: &str = "fl.framework_id, l.id, l.slug, l.name, l.allows_brief, \
    l.one_service_limit, l.unit_singular, l.unit_plural";

/// Reads framework reference data.
pub struct FrameworkRepo;

impl FrameworkRepo {
    /// List all frameworks ordered by id.
    pub async fn list(pool: &PgPool) -> Result<Vec<FrameworkRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM frameworks ORDER BY id");
        sqlx::query_as::<_, FrameworkRow>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<FrameworkRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM frameworks WHERE slug = $1");
        sqlx::query_as::<_, FrameworkRow>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Load every framework with its lots into an immutable [`Catalog`].
    ///
    /// Lots keep their `display_order` within each framework.
    pub async fn load_catalog(pool: &PgPool) -> Result<Catalog, DbError> {
        let frameworks = Self::list(pool).await?;

        let lot_query = format!(
            "SELECT {LOT_COLUMNS} \
             FROM framework_lots fl \
             JOIN lots l ON l.id = fl.lot_id \
             ORDER BY fl.framework_id, fl.display_order, l.id"
        );
        let lot_rows = sqlx::query_as::<_, FrameworkLotRow>(&lot_query)
            .fetch_all(pool)
            .await?;

        let mut lots_by_framework: HashMap<DbId, Vec<Lot>> = HashMap::new();
        for row in lot_rows {
            lots_by_framework
                .entry(row.framework_id)
                .or_default()
                .push(row.into());
        }

        let frameworks = frameworks
            .into_iter()
            .map(|row| {
                let lots = lots_by_framework.remove(&row.id).unwrap_or_default();
                row.into_framework(lots)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(frameworks = frameworks.len(), "Loaded framework catalog");
        Ok(Catalog::new(frameworks))
    }

    /// Suppliers with at least one completed draft service on the framework,
    /// in ascending order.
    pub async fn supplier_ids_with_completed_service(
        pool: &PgPool,
        framework_id: DbId,
    ) -> Result<Vec<SupplierId>, sqlx::Error> {
        let completed: Vec<String> = DraftServiceStatus::ALL
            .into_iter()
            .filter(|status| status.is_completed())
            .map(|status| status.as_str().to_string())
            .collect();
        sqlx::query_scalar(
            "SELECT DISTINCT supplier_id FROM draft_services \
             WHERE framework_id = $1 AND status = ANY($2) \
             ORDER BY supplier_id",
        )
        .bind(framework_id)
        .bind(completed)
        .fetch_all(pool)
        .await
    }
}
