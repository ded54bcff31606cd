//! Repository for the `framework_agreements` table.

use marketplace_core::agreement::FrameworkAgreement;
use marketplace_core::error::ValidationError;
use marketplace_core::types::{DbId, SupplierId};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::supplier_framework::FrameworkAgreementRow;
use crate::models::DerivedStatusRow;
use crate::predicates::{AGREEMENT_MOST_RECENT_SIGNATURE_TIME, AGREEMENT_STATUS};

/// Column list for the `framework_agreements` table, aliased `fa`.
const COLUMNS: &str = "fa.id, fa.supplier_id, fa.framework_id, fa.signed_agreement_details, \
    fa.signed_agreement_path, fa.signed_agreement_returned_at, \
    fa.signed_agreement_put_on_hold_at, fa.countersigned_agreement_details, \
    fa.countersigned_agreement_path, fa.countersigned_agreement_returned_at, \
    fa.created_at, fa.updated_at";

/// Provides persistence for framework agreements.
pub struct FrameworkAgreementRepo;

impl FrameworkAgreementRepo {
    /// Insert an unsaved agreement.
    ///
    /// The supplier must already be on the framework: the composite foreign
    /// key to `supplier_frameworks` refuses the row otherwise.
    pub async fn create(pool: &PgPool, agreement: &mut FrameworkAgreement) -> Result<DbId, DbError> {
        if let Some(id) = agreement.id() {
            return Err(ValidationError::message(format!(
                "Framework agreement {id} has already been saved"
            ))
            .into());
        }

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO framework_agreements \
                (supplier_id, framework_id, signed_agreement_details, signed_agreement_path, \
                 signed_agreement_returned_at, signed_agreement_put_on_hold_at, \
                 countersigned_agreement_details, countersigned_agreement_path, \
                 countersigned_agreement_returned_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(agreement.supplier_id())
        .bind(agreement.framework_id())
        .bind(agreement.signed_agreement_details())
        .bind(agreement.signed_agreement_path())
        .bind(agreement.signed_agreement_returned_at())
        .bind(agreement.signed_agreement_put_on_hold_at())
        .bind(agreement.countersigned_agreement_details())
        .bind(agreement.countersigned_agreement_path())
        .bind(agreement.countersigned_agreement_returned_at())
        .fetch_one(pool)
        .await?;

        agreement.mark_persisted(id);
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<FrameworkAgreement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM framework_agreements fa WHERE fa.id = $1");
        let row = sqlx::query_as::<_, FrameworkAgreementRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|row| FrameworkAgreement::from_record(row.into())))
    }

    /// Write back the signing fields of a stored agreement.
    pub async fn save(pool: &PgPool, agreement: &FrameworkAgreement) -> Result<(), DbError> {
        let id = agreement.id().ok_or_else(|| {
            ValidationError::message("Framework agreement must be created before it is saved")
        })?;
        let result = sqlx::query(
            "UPDATE framework_agreements SET \
                signed_agreement_details = $2, signed_agreement_path = $3, \
                signed_agreement_returned_at = $4, signed_agreement_put_on_hold_at = $5, \
                countersigned_agreement_details = $6, countersigned_agreement_path = $7, \
                countersigned_agreement_returned_at = $8 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(agreement.signed_agreement_details())
        .bind(agreement.signed_agreement_path())
        .bind(agreement.signed_agreement_returned_at())
        .bind(agreement.signed_agreement_put_on_hold_at())
        .bind(agreement.countersigned_agreement_details())
        .bind(agreement.countersigned_agreement_path())
        .bind(agreement.countersigned_agreement_returned_at())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("framework agreement", id));
        }

        tracing::info!(
            framework_agreement_id = id,
            supplier_id = agreement.supplier_id(),
            status = %agreement.status(),
            "Saved framework agreement"
        );
        Ok(())
    }

    /// All agreements of one supplier framework, oldest first.
    pub async fn list_for_supplier_framework(
        pool: &PgPool,
        supplier_id: SupplierId,
        framework_id: DbId,
    ) -> Result<Vec<FrameworkAgreement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM framework_agreements fa \
             WHERE fa.supplier_id = $1 AND fa.framework_id = $2 \
             ORDER BY fa.id"
        );
        let rows = sqlx::query_as::<_, FrameworkAgreementRow>(&query)
            .bind(supplier_id)
            .bind(framework_id)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| FrameworkAgreement::from_record(row.into()))
            .collect())
    }

    /// The signed agreement with the latest signature time, ties going to
    /// the highest id.
    pub async fn find_current(
        pool: &PgPool,
        supplier_id: SupplierId,
        framework_id: DbId,
    ) -> Result<Option<FrameworkAgreement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM framework_agreements fa \
             WHERE fa.supplier_id = $1 AND fa.framework_id = $2 \
               AND fa.signed_agreement_returned_at IS NOT NULL \
             ORDER BY {AGREEMENT_MOST_RECENT_SIGNATURE_TIME} DESC, fa.id DESC \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, FrameworkAgreementRow>(&query)
            .bind(supplier_id)
            .bind(framework_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|row| FrameworkAgreement::from_record(row.into())))
    }

    /// The status of every agreement as computed by the SQL predicate.
    pub async fn derived_statuses(pool: &PgPool) -> Result<Vec<DerivedStatusRow>, sqlx::Error> {
        let query =
            format!("SELECT fa.id, {AGREEMENT_STATUS} AS status FROM framework_agreements fa ORDER BY fa.id");
        sqlx::query_as::<_, DerivedStatusRow>(&query)
            .fetch_all(pool)
            .await
    }
}
