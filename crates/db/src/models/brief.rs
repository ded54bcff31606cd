//! Brief and clarification question rows.

use chrono::NaiveDate;
use marketplace_core::brief::{BriefStatus, ClarificationQuestion};
use marketplace_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `briefs` table, with the awarded response id joined in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BriefRow {
    pub id: DbId,
    pub framework_id: DbId,
    pub lot_id: DbId,
    pub data: serde_json::Value,
    pub is_a_copy: bool,
    pub published_at: Option<Timestamp>,
    pub withdrawn_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub unsuccessful_at: Option<Timestamp>,
    pub awarded_brief_response_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `brief_clarification_questions` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClarificationQuestionRow {
    pub id: DbId,
    pub brief_id: DbId,
    pub question: String,
    pub answer: String,
    pub published_at: Timestamp,
}

impl From<ClarificationQuestionRow> for ClarificationQuestion {
    fn from(row: ClarificationQuestionRow) -> Self {
        ClarificationQuestion {
            id: Some(row.id),
            question: row.question,
            answer: row.answer,
            published_at: row.published_at,
        }
    }
}

/// Filters for listing briefs.
#[derive(Debug, Clone, Default)]
pub struct BriefFilter {
    pub statuses: Vec<BriefStatus>,
    pub framework_slugs: Vec<String>,
    pub lot_slug: Option<String>,
    /// Only briefs this user is attached to.
    pub user_id: Option<DbId>,
    /// Only briefs whose applications close on this UTC date.
    pub applications_closed_on: Option<NaiveDate>,
}

impl BriefFilter {
    pub fn status_strings(&self) -> Vec<String> {
        self.statuses.iter().map(|s| s.as_str().to_string()).collect()
    }
}
