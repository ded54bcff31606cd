//! Clarification questions asked by suppliers and answered by the buyer.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::ValidationError;
use crate::render;
use crate::types::{DbId, Timestamp};
use crate::validation::{into_field_error, validate_short_answer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ClarificationQuestion {
    /// `None` until persisted.
    pub id: Option<DbId>,
    #[validate(custom(function = "validate_short_answer"))]
    pub question: String,
    #[validate(custom(function = "validate_short_answer"))]
    pub answer: String,
    pub published_at: Timestamp,
}

impl ClarificationQuestion {
    /// Build a validated, unsaved question published at `now`.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let candidate = Self {
            id: None,
            question: question.into(),
            answer: answer.into(),
            published_at: now,
        };
        candidate.check()?;
        Ok(candidate)
    }

    /// Field-level checks; failures map field name to reason code.
    pub fn check(&self) -> Result<(), ValidationError> {
        self.validate().map_err(into_field_error)
    }

    pub fn serialize(&self) -> Value {
        json!({
            "question": self.question,
            "answer": self.answer,
            "publishedAt": render::timestamp(&self.published_at),
        })
    }
}
