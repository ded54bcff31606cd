//! Field-level validation helpers shared across entities.
//!
//! Each check is pure and reports a short reason code. The codes double as
//! the values of [`ValidationError::Fields`] mappings, and the
//! `validator`-derived rule sets on entity inputs call into the same checks.

use chrono::NaiveDate;

use crate::error::ValidationError;

/// The value is empty or only whitespace.
pub const ANSWER_REQUIRED: &str = "answer_required";

/// The value has more whitespace-separated words than allowed.
pub const UNDER_100_WORDS: &str = "under_100_words";

/// The value has more characters than allowed.
pub const UNDER_CHARACTER_LIMIT: &str = "under_character_limit";

/// Word limit applied to short free-text answers.
pub const MAX_SHORT_ANSWER_WORDS: usize = 100;

/// Character limit applied to short free-text answers.
pub const MAX_SHORT_ANSWER_CHARS: usize = 5000;

/// Date format for calendar dates in supplier payloads.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn require_non_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::message(ANSWER_REQUIRED));
    }
    Ok(())
}

pub fn require_word_count_at_most(value: &str, max_words: usize) -> Result<(), ValidationError> {
    if value.split_whitespace().count() > max_words {
        return Err(ValidationError::message(UNDER_100_WORDS));
    }
    Ok(())
}

pub fn require_char_count_at_most(value: &str, max_chars: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max_chars {
        return Err(ValidationError::message(UNDER_CHARACTER_LIMIT));
    }
    Ok(())
}

/// Parse a calendar date, rejecting anything not in exactly `format`.
///
/// `label` names the field in the error, e.g. `"Registration date"`.
pub fn parse_date_strict(
    value: &str,
    format: &str,
    label: &str,
) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, format).map_err(|_| {
        ValidationError::message(format!("{label} format must be {format}"))
    })
}

/// Reason code for a short free-text answer, or `None` when it passes.
///
/// Checks run in order: required, word count, character count.
pub fn short_answer_code(value: &str) -> Option<&'static str> {
    let checks = [
        require_non_empty(value).err().map(|_| ANSWER_REQUIRED),
        require_word_count_at_most(value, MAX_SHORT_ANSWER_WORDS)
            .err()
            .map(|_| UNDER_100_WORDS),
        require_char_count_at_most(value, MAX_SHORT_ANSWER_CHARS)
            .err()
            .map(|_| UNDER_CHARACTER_LIMIT),
    ];
    checks.into_iter().flatten().next()
}

/// `validator` custom rule wrapping [`short_answer_code`].
pub fn validate_short_answer(value: &str) -> Result<(), validator::ValidationError> {
    match short_answer_code(value) {
        Some(code) => Err(validator::ValidationError::new(code)),
        None => Ok(()),
    }
}

/// Collapse `validator` output into a field → reason code mapping.
///
/// Only the first failing rule per field is kept.
pub fn into_field_error(errors: validator::ValidationErrors) -> ValidationError {
    let fields = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first()
                .map(|err| (field.to_string(), err.code.to_string()))
        })
        .collect();
    ValidationError::Fields(fields)
}
