//! Repository for the `services` and `archived_services` tables.

use marketplace_core::service::{ArchivedService, Service, ServiceRecord};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::service::{ServiceFilter, ServiceRow};

/// Column list shared by `services` and `archived_services`.
const COLUMNS: &str = "id, service_id, supplier_id, framework_id, lot_id, data, status, \
    updated_by, updated_reason, created_at, updated_at";

/// Provides persistence for services. Every update archives the prior row.
pub struct ServiceRepo;

impl ServiceRepo {
    /// Insert a new service.
    ///
    /// A lot outside the framework is refused by the `framework_lots` foreign key.
    pub async fn create(pool: &PgPool, service: &Service) -> Result<Service, DbError> {
        let query = format!(
            "INSERT INTO services \
                (service_id, supplier_id, framework_id, lot_id, data, status, updated_by, updated_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ServiceRow>(&query)
            .bind(service.service_id())
            .bind(service.supplier_id())
            .bind(service.framework_id())
            .bind(service.lot_id())
            .bind(service.data())
            .bind(service.status().as_str())
            .bind(service.updated_by())
            .bind(service.updated_reason())
            .fetch_one(pool)
            .await?;
        Ok(Service::from_record(ServiceRecord::try_from(row)?))
    }

    pub async fn find_by_service_id(pool: &PgPool, service_id: &str) -> Result<Option<Service>, DbError> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE service_id = $1");
        let row = sqlx::query_as::<_, ServiceRow>(&query)
            .bind(service_id)
            .fetch_optional(pool)
            .await?;
        row.map(|row| Ok::<_, DbError>(Service::from_record(ServiceRecord::try_from(row)?)))
            .transpose()
    }

    /// Write `service` back, archiving the stored row in the same transaction.
    ///
    /// The stored row is locked while it is copied.
    pub async fn update(pool: &PgPool, service: &Service) -> Result<Service, DbError> {
        let mut tx = pool.begin().await?;

        let archive_query = format!(
            "INSERT INTO archived_services \
                (service_id, supplier_id, framework_id, lot_id, data, status, \
                 updated_by, updated_reason, created_at, updated_at) \
             SELECT service_id, supplier_id, framework_id, lot_id, data, status, \
                    updated_by, updated_reason, created_at, updated_at \
             FROM (SELECT {COLUMNS} FROM services WHERE service_id = $1 FOR UPDATE) prior \
             RETURNING id"
        );
        let archived_id: i64 = sqlx::query_scalar(&archive_query)
            .bind(service.service_id())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("service", service.service_id()))?;

        let update_query = format!(
            "UPDATE services SET \
                data = $2, status = $3, updated_by = $4, updated_reason = $5 \
             WHERE service_id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ServiceRow>(&update_query)
            .bind(service.service_id())
            .bind(service.data())
            .bind(service.status().as_str())
            .bind(service.updated_by())
            .bind(service.updated_reason())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            service_id = %service.service_id(),
            archived_service_id = archived_id,
            updated_by = %service.updated_by(),
            "Archived service before update"
        );
        Ok(Service::from_record(ServiceRecord::try_from(row)?))
    }

    /// List services in default order: framework, lot, then service name.
    pub async fn list(pool: &PgPool, filter: &ServiceFilter) -> Result<Vec<Service>, DbError> {
        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();
        let (contains_key, contains_value) = match &filter.data_key_contains_value {
            Some((key, value)) => (Some(key.as_str()), Some(value.as_str())),
            None => (None, None),
        };

        let query = "SELECT s.id, s.service_id, s.supplier_id, s.framework_id, s.lot_id, s.data, \
                s.status, s.updated_by, s.updated_reason, s.created_at, s.updated_at \
             FROM services s \
             JOIN frameworks f ON f.id = s.framework_id \
             JOIN lots l ON l.id = s.lot_id \
             WHERE (NOT $1 OR f.status = 'live') \
               AND (cardinality($2::TEXT[]) = 0 OR s.status = ANY($2)) \
               AND ($3::BIGINT IS NULL OR s.supplier_id = $3) \
               AND ($4::TEXT IS NULL OR l.slug = $4) \
               AND ($5::TEXT IS NULL OR s.data -> $5 IS NOT NULL) \
               AND ($6::TEXT IS NULL OR s.data -> $6 @> jsonb_build_array($7::TEXT)) \
             ORDER BY s.framework_id, s.lot_id, s.data->>'serviceName', s.id";
        let rows = sqlx::query_as::<_, ServiceRow>(query)
            .bind(filter.framework_is_live)
            .bind(&statuses)
            .bind(filter.supplier_id)
            .bind(filter.lot_slug.as_deref())
            .bind(filter.data_has_key.as_deref())
            .bind(contains_key)
            .bind(contains_value)
            .fetch_all(pool)
            .await?;

        rows.into_iter()
            .map(|row| Ok::<_, DbError>(Service::from_record(ServiceRecord::try_from(row)?)))
            .collect()
    }

    /// Archived snapshots of one service, oldest first.
    pub async fn list_archived(
        pool: &PgPool,
        service_id: &str,
    ) -> Result<Vec<ArchivedService>, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM archived_services \
             WHERE service_id = $1 \
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ServiceRow>(&query)
            .bind(service_id)
            .fetch_all(pool)
            .await?;

        rows.into_iter()
            .map(|row| Ok::<_, DbError>(ArchivedService::from_record(ServiceRecord::try_from(row)?)))
            .collect()
    }
}
