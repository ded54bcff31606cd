//! Repository for the `brief_responses` table.

use marketplace_core::brief_response::{BriefResponse, BriefResponseRecord, SupplierSummary};
use marketplace_core::catalog::Catalog;
use marketplace_core::error::ValidationError;
use marketplace_core::render::LinkBuilder;
use marketplace_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::brief_response::{BriefResponseFilter, BriefResponseRow, SupplierSummaryRow};
use crate::models::{DerivedStatusRow, StatusCount};
use crate::predicates::BRIEF_RESPONSE_STATUS;
use crate::repositories::BriefRepo;

/// Column list for the `brief_responses` table, aliased `br`.
const COLUMNS: &str = "br.id, br.brief_id, br.supplier_id, br.data, br.award_details, \
    br.submitted_at, br.awarded_at, br.created_at, br.updated_at";

/// Provides persistence and the award workflow for brief responses.
pub struct BriefResponseRepo;

impl BriefResponseRepo {
    /// Insert an unsaved response.
    pub async fn create(pool: &PgPool, response: &mut BriefResponse) -> Result<DbId, DbError> {
        if let Some(id) = response.id() {
            return Err(
                ValidationError::message(format!("Brief response {id} has already been saved")).into(),
            );
        }

        let (id, created_at): (DbId, Timestamp) = sqlx::query_as(
            "INSERT INTO brief_responses \
                (brief_id, supplier_id, data, award_details, submitted_at, awarded_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, created_at",
        )
        .bind(response.brief_id())
        .bind(response.supplier_id())
        .bind(response.data())
        .bind(response.award_details())
        .bind(response.submitted_at())
        .bind(response.awarded_at())
        .fetch_one(pool)
        .await?;

        response.mark_persisted(id, created_at);
        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BriefResponse>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM brief_responses br WHERE br.id = $1");
        let row = sqlx::query_as::<_, BriefResponseRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|row| BriefResponse::from_record(BriefResponseRecord::from(row))))
    }

    /// List responses matching `filter`, oldest first.
    pub async fn list(
        pool: &PgPool,
        filter: &BriefResponseFilter,
    ) -> Result<Vec<BriefResponse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM brief_responses br \
             WHERE ($1::BIGINT IS NULL OR br.brief_id = $1) \
               AND ($2::BIGINT IS NULL OR br.supplier_id = $2) \
               AND (cardinality($3::TEXT[]) = 0 OR ({BRIEF_RESPONSE_STATUS}) = ANY($3)) \
             ORDER BY br.id"
        );
        let rows = sqlx::query_as::<_, BriefResponseRow>(&query)
            .bind(filter.brief_id)
            .bind(filter.supplier_id)
            .bind(filter.status_strings())
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| BriefResponse::from_record(row.into()))
            .collect())
    }

    /// Write back payload, award details and timestamps.
    ///
    /// A second awarded response for the same brief is refused by
    /// `uq_brief_responses_awarded_per_brief`.
    pub async fn save(pool: &PgPool, response: &BriefResponse) -> Result<(), DbError> {
        let id = response.id().ok_or_else(|| {
            ValidationError::message("Brief response must be created before it is saved")
        })?;
        let result = sqlx::query(
            "UPDATE brief_responses SET \
                data = $2, award_details = $3, submitted_at = $4, awarded_at = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(response.data())
        .bind(response.award_details())
        .bind(response.submitted_at())
        .bind(response.awarded_at())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("brief response", id));
        }
        Ok(())
    }

    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        let query = format!(
            "SELECT status, COUNT(*) AS count \
             FROM (SELECT {BRIEF_RESPONSE_STATUS} AS status FROM brief_responses br) derived \
             GROUP BY status \
             ORDER BY status"
        );
        sqlx::query_as::<_, StatusCount>(&query)
            .fetch_all(pool)
            .await
    }

    /// The status of every response as computed by the SQL predicate.
    pub async fn derived_statuses(pool: &PgPool) -> Result<Vec<DerivedStatusRow>, sqlx::Error> {
        let query =
            format!("SELECT br.id, {BRIEF_RESPONSE_STATUS} AS status FROM brief_responses br ORDER BY br.id");
        sqlx::query_as::<_, DerivedStatusRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Award a response in one transaction with the response row locked.
    ///
    /// Every award rule is checked against the parent brief first. If another
    /// response of the same brief is awarded concurrently, the losing
    /// transaction fails on the unique index and that error is returned as is.
    pub async fn award(
        pool: &PgPool,
        catalog: &Catalog,
        brief_response_id: DbId,
        award_details: serde_json::Value,
        awarded_at: Timestamp,
    ) -> Result<BriefResponse, DbError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM brief_responses br WHERE br.id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, BriefResponseRow>(&query)
            .bind(brief_response_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("brief response", brief_response_id))?;
        let mut response = BriefResponse::from_record(row.into());

        let mut brief = BriefRepo::load(&mut tx, catalog, response.brief_id())
            .await?
            .ok_or_else(|| DbError::not_found("brief", response.brief_id()))?;

        response.award(&mut brief, award_details, awarded_at)?;

        sqlx::query(
            "UPDATE brief_responses SET award_details = $2, awarded_at = $3 \
             WHERE id = $1",
        )
        .bind(brief_response_id)
        .bind(response.award_details())
        .bind(response.awarded_at())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            brief_id = response.brief_id(),
            brief_response_id,
            supplier_id = response.supplier_id(),
            "Awarded brief response"
        );
        Ok(response)
    }

    /// Load a response and render it with its brief and supplier summary.
    ///
    /// The organisation size comes from the supplier's declaration on the
    /// brief's framework.
    pub async fn find_serialized(
        pool: &PgPool,
        catalog: &Catalog,
        links: &dyn LinkBuilder,
        id: DbId,
    ) -> Result<Option<serde_json::Value>, DbError> {
        let Some(response) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let brief = BriefRepo::find_by_id(pool, catalog, response.brief_id())
            .await?
            .ok_or_else(|| DbError::not_found("brief", response.brief_id()))?;

        let supplier = sqlx::query_as::<_, SupplierSummaryRow>(
            "SELECT s.name, sf.declaration->>'organisationSize' AS organisation_size \
             FROM suppliers s \
             LEFT JOIN supplier_frameworks sf \
               ON sf.supplier_id = s.supplier_id AND sf.framework_id = $2 \
             WHERE s.supplier_id = $1",
        )
        .bind(response.supplier_id())
        .bind(brief.framework().id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DbError::not_found("supplier", response.supplier_id()))?;

        Ok(Some(response.serialize(
            &brief,
            SupplierSummary {
                name: &supplier.name,
                organisation_size: supplier.organisation_size.as_deref(),
            },
            links,
        )))
    }
}
