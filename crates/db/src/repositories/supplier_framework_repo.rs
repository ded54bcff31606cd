//! Repository for the `supplier_frameworks` table.

use marketplace_core::agreement::SupplierFramework;
use marketplace_core::types::{DbId, SupplierId};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::supplier_framework::SupplierFrameworkRow;

/// Column list for the `supplier_frameworks` table.
const COLUMNS: &str = "supplier_id, framework_id, declaration, on_framework, \
    prefill_declaration_from_framework_id, created_at, updated_at";

/// Provides persistence for a supplier's participation in frameworks.
pub struct SupplierFrameworkRepo;

impl SupplierFrameworkRepo {
    /// Insert a new supplier framework.
    ///
    /// A prefill pointer must name another framework the same supplier is
    /// already on; the composite foreign key refuses anything else.
    pub async fn create(
        pool: &PgPool,
        supplier_framework: &SupplierFramework,
    ) -> Result<SupplierFramework, sqlx::Error> {
        let query = format!(
            "INSERT INTO supplier_frameworks \
                (supplier_id, framework_id, declaration, on_framework, \
                 prefill_declaration_from_framework_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SupplierFrameworkRow>(&query)
            .bind(supplier_framework.supplier_id())
            .bind(supplier_framework.framework_id())
            .bind(supplier_framework.declaration())
            .bind(supplier_framework.on_framework())
            .bind(supplier_framework.prefill_declaration_from_framework_id())
            .fetch_one(pool)
            .await?;
        Ok(SupplierFramework::from_record(row.into()))
    }

    pub async fn find(
        pool: &PgPool,
        supplier_id: SupplierId,
        framework_id: DbId,
    ) -> Result<Option<SupplierFramework>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM supplier_frameworks \
             WHERE supplier_id = $1 AND framework_id = $2"
        );
        let row = sqlx::query_as::<_, SupplierFrameworkRow>(&query)
            .bind(supplier_id)
            .bind(framework_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|row| SupplierFramework::from_record(row.into())))
    }

    /// Every framework the supplier participates in, ordered by framework id.
    pub async fn list_for_supplier(
        pool: &PgPool,
        supplier_id: SupplierId,
    ) -> Result<Vec<SupplierFramework>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM supplier_frameworks \
             WHERE supplier_id = $1 \
             ORDER BY framework_id"
        );
        let rows = sqlx::query_as::<_, SupplierFrameworkRow>(&query)
            .bind(supplier_id)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| SupplierFramework::from_record(row.into()))
            .collect())
    }

    pub async fn save(pool: &PgPool, supplier_framework: &SupplierFramework) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE supplier_frameworks SET \
                declaration = $3, on_framework = $4, prefill_declaration_from_framework_id = $5 \
             WHERE supplier_id = $1 AND framework_id = $2",
        )
        .bind(supplier_framework.supplier_id())
        .bind(supplier_framework.framework_id())
        .bind(supplier_framework.declaration())
        .bind(supplier_framework.on_framework())
        .bind(supplier_framework.prefill_declaration_from_framework_id())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "supplier framework",
                format!("{}/{}", supplier_framework.supplier_id(), supplier_framework.framework_id()),
            ));
        }
        Ok(())
    }

    /// Delete a supplier framework.
    ///
    /// Refused while another framework prefills from it or agreements exist.
    /// Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        supplier_id: SupplierId,
        framework_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM supplier_frameworks \
             WHERE supplier_id = $1 AND framework_id = $2",
        )
        .bind(supplier_id)
        .bind(framework_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
