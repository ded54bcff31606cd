//! Repository for the `briefs`, `brief_users` and
//! `brief_clarification_questions` tables.
//!
//! Brief status is never stored. Filters and ordering use the SQL mirrors
//! in [`crate::predicates`]; loaded rows derive their status in process.

use std::collections::HashMap;

use marketplace_core::brief::{Brief, BriefRecord, ClarificationQuestion};
use marketplace_core::catalog::Catalog;
use marketplace_core::error::ValidationError;
use marketplace_core::types::{DbId, Timestamp};
use marketplace_core::user::User;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::brief::{BriefFilter, BriefRow, ClarificationQuestionRow};
use crate::models::user::BriefUserRow;
use crate::models::{DerivedStatusRow, StatusCount};
use crate::predicates::{
    BRIEF_APPLICATIONS_CLOSED_AT, BRIEF_AWARDED_RESPONSE_ID, BRIEF_STATUS, BRIEF_STATUS_ORDER,
};

/// Column list for the `briefs` table, aliased `b`.
const COLUMNS: &str = "b.id, b.framework_id, b.lot_id, b.data, b.is_a_copy, b.published_at, \
    b.withdrawn_at, b.cancelled_at, b.unsuccessful_at, b.created_at, b.updated_at";

/// Column list for the `brief_clarification_questions` table.
const QUESTION_COLUMNS: &str = "id, brief_id, question, answer, published_at";

/// Provides persistence and status queries for briefs.
pub struct BriefRepo;

impl BriefRepo {
    /// Insert an unsaved brief with its users and clarification questions.
    pub async fn create(pool: &PgPool, brief: &mut Brief) -> Result<DbId, DbError> {
        if let Some(id) = brief.id() {
            return Err(ValidationError::message(format!("Brief {id} has already been saved")).into());
        }

        let mut tx = pool.begin().await?;

        let (id, created_at, updated_at): (DbId, Timestamp, Timestamp) = sqlx::query_as(
            "INSERT INTO briefs \
                (framework_id, lot_id, data, is_a_copy, published_at, withdrawn_at, \
                 cancelled_at, unsuccessful_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, created_at, updated_at",
        )
        .bind(brief.framework().id)
        .bind(brief.lot().id)
        .bind(brief.data())
        .bind(brief.is_a_copy())
        .bind(brief.published_at())
        .bind(brief.withdrawn_at())
        .bind(brief.cancelled_at())
        .bind(brief.unsuccessful_at())
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_users(&mut tx, id, brief.users()).await?;
        let question_ids = Self::insert_questions(&mut tx, id, brief.clarification_questions()).await?;

        tx.commit().await?;

        brief.mark_persisted(id, created_at, updated_at);
        for (index, question_id) in question_ids {
            brief.mark_question_persisted(index, question_id);
        }
        Ok(id)
    }

    /// Find a brief by id, resolving its framework and lot through `catalog`.
    pub async fn find_by_id(
        pool: &PgPool,
        catalog: &Catalog,
        id: DbId,
    ) -> Result<Option<Brief>, DbError> {
        let mut conn = pool.acquire().await?;
        Self::load(&mut conn, catalog, id).await
    }

    /// List briefs matching `filter` in status order, newest publication
    /// first, then by id.
    pub async fn list(
        pool: &PgPool,
        catalog: &Catalog,
        filter: &BriefFilter,
    ) -> Result<Vec<Brief>, DbError> {
        let query = format!(
            "{select} \
             JOIN frameworks f ON f.id = b.framework_id \
             JOIN lots l ON l.id = b.lot_id \
             WHERE (cardinality($1::TEXT[]) = 0 OR ({BRIEF_STATUS}) = ANY($1)) \
               AND (cardinality($2::TEXT[]) = 0 OR f.slug = ANY($2)) \
               AND ($3::TEXT IS NULL OR l.slug = $3) \
               AND ($4::BIGINT IS NULL OR EXISTS ( \
                    SELECT 1 FROM brief_users bu WHERE bu.brief_id = b.id AND bu.user_id = $4)) \
               AND ($5::DATE IS NULL OR ({BRIEF_APPLICATIONS_CLOSED_AT} AT TIME ZONE 'UTC')::DATE = $5) \
             ORDER BY {BRIEF_STATUS_ORDER}, b.published_at DESC NULLS LAST, b.id",
            select = select_briefs(),
        );
        let rows = sqlx::query_as::<_, BriefRow>(&query)
            .bind(filter.status_strings())
            .bind(&filter.framework_slugs)
            .bind(filter.lot_slug.as_deref())
            .bind(filter.user_id)
            .bind(filter.applications_closed_on)
            .fetch_all(pool)
            .await?;

        let mut conn = pool.acquire().await?;
        Self::assemble(&mut conn, catalog, rows).await
    }

    /// Number of briefs in each derived status. Statuses with no briefs are absent.
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        let query = format!(
            "SELECT status, COUNT(*) AS count \
             FROM (SELECT {BRIEF_STATUS} AS status FROM briefs b) derived \
             GROUP BY status \
             ORDER BY status"
        );
        sqlx::query_as::<_, StatusCount>(&query)
            .fetch_all(pool)
            .await
    }

    /// The status of every brief as computed by the SQL predicate.
    pub async fn derived_statuses(pool: &PgPool) -> Result<Vec<DerivedStatusRow>, sqlx::Error> {
        let query = format!("SELECT b.id, {BRIEF_STATUS} AS status FROM briefs b ORDER BY b.id");
        sqlx::query_as::<_, DerivedStatusRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Write back the payload and lifecycle timestamps, adding any new users
    /// and unsaved clarification questions.
    pub async fn save(pool: &PgPool, brief: &mut Brief) -> Result<(), DbError> {
        let id = brief
            .id()
            .ok_or_else(|| ValidationError::message("Brief must be created before it is saved"))?;

        let mut tx = pool.begin().await?;

        let (created_at, updated_at): (Timestamp, Timestamp) = sqlx::query_as(
            "UPDATE briefs SET \
                data = $2, published_at = $3, withdrawn_at = $4, \
                cancelled_at = $5, unsuccessful_at = $6 \
             WHERE id = $1 \
             RETURNING created_at, updated_at",
        )
        .bind(id)
        .bind(brief.data())
        .bind(brief.published_at())
        .bind(brief.withdrawn_at())
        .bind(brief.cancelled_at())
        .bind(brief.unsuccessful_at())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("brief", id))?;

        Self::insert_users(&mut tx, id, brief.users()).await?;
        let question_ids = Self::insert_questions(&mut tx, id, brief.clarification_questions()).await?;

        tx.commit().await?;

        brief.mark_persisted(id, created_at, updated_at);
        for (index, question_id) in question_ids {
            brief.mark_question_persisted(index, question_id);
        }
        Ok(())
    }

    /// Apply a requested status through the transition table and save it.
    ///
    /// `brief` only changes once the new status is stored.
    pub async fn update_status(pool: &PgPool, brief: &mut Brief, requested: &str) -> Result<(), DbError> {
        let previous = brief.status();
        let mut updated = brief.clone();
        updated.set_status(requested)?;
        Self::save(pool, &mut updated).await?;
        *brief = updated;

        tracing::info!(
            brief_id = ?brief.id(),
            from = %previous,
            to = %brief.status(),
            "Brief status changed"
        );
        Ok(())
    }

    /// Add a clarification question to a live brief and store it.
    ///
    /// `brief` is left untouched if the question cannot be stored.
    pub async fn add_clarification_question(
        pool: &PgPool,
        brief: &mut Brief,
        question: &str,
        answer: &str,
    ) -> Result<ClarificationQuestion, DbError> {
        let brief_id = brief.id().ok_or_else(|| {
            ValidationError::message("Brief must be created before questions can be added")
        })?;
        let mut updated = brief.clone();
        let question = updated.add_clarification_question(question, answer)?.clone();

        let mut conn = pool.acquire().await?;
        let mut ids = Self::insert_questions(&mut conn, brief_id, std::slice::from_ref(&question)).await?;
        let (_, question_id) = ids
            .pop()
            .ok_or_else(|| DbError::not_found("clarification question", brief_id))?;

        let index = updated.clarification_questions().len() - 1;
        updated.mark_question_persisted(index, question_id);
        *brief = updated;
        Ok(ClarificationQuestion {
            id: Some(question_id),
            ..question
        })
    }

    /// Copy a stored brief into a new draft and store the copy.
    pub async fn copy(pool: &PgPool, catalog: &Catalog, id: DbId) -> Result<Brief, DbError> {
        let source = Self::find_by_id(pool, catalog, id)
            .await?
            .ok_or_else(|| DbError::not_found("brief", id))?;

        let mut copy = source.copy(catalog)?;
        let copy_id = Self::create(pool, &mut copy).await?;

        tracing::info!(
            source_brief_id = id,
            brief_id = copy_id,
            framework = %copy.framework().slug,
            "Copied brief"
        );
        Ok(copy)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Load one brief on an existing connection or transaction.
    pub(crate) async fn load(
        conn: &mut PgConnection,
        catalog: &Catalog,
        id: DbId,
    ) -> Result<Option<Brief>, DbError> {
        let query = format!("{} WHERE b.id = $1", select_briefs());
        let row = sqlx::query_as::<_, BriefRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let mut briefs = Self::assemble(conn, catalog, vec![row]).await?;
                Ok(briefs.pop())
            }
            None => Ok(None),
        }
    }

    /// Attach users and questions to loaded rows, keeping row order.
    async fn assemble(
        conn: &mut PgConnection,
        catalog: &Catalog,
        rows: Vec<BriefRow>,
    ) -> Result<Vec<Brief>, DbError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<DbId> = rows.iter().map(|row| row.id).collect();

        let user_rows = sqlx::query_as::<_, BriefUserRow>(
            "SELECT bu.brief_id, u.id, u.email_address, u.name, u.role \
             FROM brief_users bu \
             JOIN users u ON u.id = bu.user_id \
             WHERE bu.brief_id = ANY($1) \
             ORDER BY bu.brief_id, bu.created_at, u.id",
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let question_query = format!(
            "SELECT {QUESTION_COLUMNS} FROM brief_clarification_questions \
             WHERE brief_id = ANY($1) \
             ORDER BY brief_id, id"
        );
        let question_rows = sqlx::query_as::<_, ClarificationQuestionRow>(&question_query)
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;

        let mut users: HashMap<DbId, Vec<User>> = HashMap::new();
        for row in user_rows {
            users.entry(row.brief_id).or_default().push(row.into());
        }
        let mut questions: HashMap<DbId, Vec<ClarificationQuestion>> = HashMap::new();
        for row in question_rows {
            questions.entry(row.brief_id).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let users = users.remove(&row.id).unwrap_or_default();
                let questions = questions.remove(&row.id).unwrap_or_default();
                into_brief(catalog, row, users, questions)
            })
            .collect()
    }

    async fn insert_users(conn: &mut PgConnection, brief_id: DbId, users: &[User]) -> Result<(), sqlx::Error> {
        if users.is_empty() {
            return Ok(());
        }
        let user_ids: Vec<DbId> = users.iter().map(|user| user.id).collect();
        sqlx::query(
            "INSERT INTO brief_users (brief_id, user_id) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT DO NOTHING",
        )
        .bind(brief_id)
        .bind(&user_ids)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Insert the questions that have no id yet. Returns `(index, new id)` pairs.
    async fn insert_questions(
        conn: &mut PgConnection,
        brief_id: DbId,
        questions: &[ClarificationQuestion],
    ) -> Result<Vec<(usize, DbId)>, sqlx::Error> {
        let mut inserted = Vec::new();
        for (index, question) in questions.iter().enumerate() {
            if question.id.is_some() {
                continue;
            }
            let id: DbId = sqlx::query_scalar(
                "INSERT INTO brief_clarification_questions (brief_id, question, answer, published_at) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id",
            )
            .bind(brief_id)
            .bind(&question.question)
            .bind(&question.answer)
            .bind(question.published_at)
            .fetch_one(&mut *conn)
            .await?;
            inserted.push((index, id));
        }
        Ok(inserted)
    }
}

/// `SELECT` over `briefs b` including the awarded response id.
fn select_briefs() -> String {
    format!("SELECT {COLUMNS}, {BRIEF_AWARDED_RESPONSE_ID} AS awarded_brief_response_id FROM briefs b")
}

fn into_brief(
    catalog: &Catalog,
    row: BriefRow,
    users: Vec<User>,
    clarification_questions: Vec<ClarificationQuestion>,
) -> Result<Brief, DbError> {
    let framework = catalog
        .framework_by_id(row.framework_id)
        .cloned()
        .ok_or_else(|| DbError::not_found("framework", row.framework_id))?;
    let lot = framework
        .get_lot_by_id(row.lot_id)
        .cloned()
        .ok_or_else(|| DbError::not_found("lot", row.lot_id))?;

    Ok(Brief::from_record(BriefRecord {
        id: row.id,
        framework,
        lot,
        data: row.data,
        users,
        clarification_questions,
        published_at: row.published_at,
        withdrawn_at: row.withdrawn_at,
        cancelled_at: row.cancelled_at,
        unsuccessful_at: row.unsuccessful_at,
        awarded_brief_response_id: row.awarded_brief_response_id,
        is_a_copy: row.is_a_copy,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
