//! Closing-date arithmetic for published briefs.

use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;

use crate::types::Timestamp;

/// `requirementsLength` value selecting the short application window.
pub const ONE_WEEK: &str = "1 week";

/// Application window for one-week briefs.
pub const ONE_WEEK_DAYS: i64 = 7;

/// Application window for every other brief.
pub const DEFAULT_DAYS: i64 = 14;

/// Clarification questions close this many days before applications do.
pub const QUESTIONS_CLOSE_DAYS_BEFORE: i64 = 7;

/// Answers are published by this many days before applications close.
pub const ANSWERS_PUBLISHED_DAYS_BEFORE: i64 = 1;

/// Days from publication until applications close, read from `requirementsLength`.
pub fn application_window_days(data: &Value) -> i64 {
    match data.get("requirementsLength").and_then(Value::as_str) {
        Some(ONE_WEEK) => ONE_WEEK_DAYS,
        _ => DEFAULT_DAYS,
    }
}

/// 23:59:59 UTC on the calendar day of `ts`.
pub fn end_of_day(ts: Timestamp) -> Option<Timestamp> {
    let naive = ts.date_naive().and_hms_opt(23, 59, 59)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Derived deadlines of a published brief.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingDates {
    pub applications_closed_at: Timestamp,
    pub clarification_questions_closed_at: Timestamp,
    pub clarification_questions_published_by: Timestamp,
}

/// Deadlines for a brief published at `published_at`, `None` for drafts.
pub fn closing_dates(published_at: Option<Timestamp>, data: &Value) -> Option<ClosingDates> {
    let published_at = published_at?;
    let applications_closed_at =
        end_of_day(published_at + Duration::days(application_window_days(data)))?;
    Some(ClosingDates {
        applications_closed_at,
        clarification_questions_closed_at: end_of_day(
            applications_closed_at - Duration::days(QUESTIONS_CLOSE_DAYS_BEFORE),
        )?,
        clarification_questions_published_by: end_of_day(
            applications_closed_at - Duration::days(ANSWERS_PUBLISHED_DAYS_BEFORE),
        )?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn published_at() -> Timestamp {
        let naive = NaiveDate::from_ymd_opt(2016, 3, 3)
            .unwrap()
            .and_hms_micro_opt(12, 30, 1, 2)
            .unwrap();
        Utc.from_utc_datetime(&naive)
    }

    fn ymd_end(year: i32, month: u32, day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(year, month, day, 23, 59, 59).unwrap()
    }

    #[test]
    fn drafts_have_no_closing_dates() {
        assert_eq!(closing_dates(None, &json!({})), None);
    }

    #[test]
    fn default_window_is_two_weeks() {
        let dates = closing_dates(Some(published_at()), &json!({})).unwrap();
        assert_eq!(dates.applications_closed_at, ymd_end(2016, 3, 17));
        assert_eq!(dates.clarification_questions_closed_at, ymd_end(2016, 3, 10));
        assert_eq!(dates.clarification_questions_published_by, ymd_end(2016, 3, 16));
    }

    #[test]
    fn explicit_two_weeks_matches_default() {
        let dates =
            closing_dates(Some(published_at()), &json!({"requirementsLength": "2 weeks"})).unwrap();
        assert_eq!(dates.applications_closed_at, ymd_end(2016, 3, 17));
    }

    #[test]
    fn one_week_window() {
        let dates =
            closing_dates(Some(published_at()), &json!({"requirementsLength": "1 week"})).unwrap();
        assert_eq!(dates.applications_closed_at, ymd_end(2016, 3, 10));
        assert_eq!(dates.clarification_questions_closed_at, ymd_end(2016, 3, 3));
        assert_eq!(dates.clarification_questions_published_by, ymd_end(2016, 3, 9));
    }

    #[test]
    fn sub_second_fraction_is_discarded() {
        let dates = closing_dates(Some(published_at()), &json!({})).unwrap();
        assert_eq!(dates.applications_closed_at.timestamp_subsec_micros(), 0);
    }
}
