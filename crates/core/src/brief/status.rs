//! Brief lifecycle status, derived from stored timestamps.
//!
//! [`derive_brief_status`] is the single source of truth. The SQL predicate in
//! `marketplace_db::predicates` must select exactly the rows for which this
//! function returns a given status; both are covered by the equivalence tests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::Timestamp;

/// Brief statuses, declared in listing order (index 0 sorts first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BriefStatus {
    Live,
    Closed,
    Awarded,
    Cancelled,
    Unsuccessful,
    Draft,
    Withdrawn,
}

impl BriefStatus {
    pub const ALL: [BriefStatus; 7] = [
        BriefStatus::Live,
        BriefStatus::Closed,
        BriefStatus::Awarded,
        BriefStatus::Cancelled,
        BriefStatus::Unsuccessful,
        BriefStatus::Draft,
        BriefStatus::Withdrawn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BriefStatus::Live => "live",
            BriefStatus::Closed => "closed",
            BriefStatus::Awarded => "awarded",
            BriefStatus::Cancelled => "cancelled",
            BriefStatus::Unsuccessful => "unsuccessful",
            BriefStatus::Draft => "draft",
            BriefStatus::Withdrawn => "withdrawn",
        }
    }

    /// Position in default listings.
    pub fn sort_index(self) -> i32 {
        self as i32
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl fmt::Display for BriefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BriefStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| ValidationError::message(format!("Invalid brief status '{value}'")))
    }
}

/// The stored fields a brief's status depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BriefStatusFields {
    pub published_at: Option<Timestamp>,
    pub withdrawn_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub unsuccessful_at: Option<Timestamp>,
    pub applications_closed_at: Option<Timestamp>,
    pub has_awarded_response: bool,
}

pub fn derive_brief_status(fields: &BriefStatusFields, now: Timestamp) -> BriefStatus {
    if fields.withdrawn_at.is_some() {
        return BriefStatus::Withdrawn;
    }
    if fields.published_at.is_none() {
        return BriefStatus::Draft;
    }
    if fields.cancelled_at.is_some() {
        return BriefStatus::Cancelled;
    }
    if fields.unsuccessful_at.is_some() {
        return BriefStatus::Unsuccessful;
    }
    if fields.has_awarded_response {
        return BriefStatus::Awarded;
    }
    match fields.applications_closed_at {
        Some(closes) if now < closes => BriefStatus::Live,
        _ => BriefStatus::Closed,
    }
}

/// The timestamp side effect of a permitted status assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Requested status equals the current one.
    Unchanged,
    /// draft → live: set `published_at`.
    Publish,
    /// live → withdrawn: set `withdrawn_at`.
    Withdraw,
    /// closed → cancelled: set `cancelled_at`.
    Cancel,
    /// closed → unsuccessful: set `unsuccessful_at`.
    MarkUnsuccessful,
}

/// Check a requested status assignment against the transition table.
///
/// `requested` is taken verbatim so unknown values produce the same
/// "Cannot change brief status" message as illegal ones.
pub fn plan_status_change(
    current: BriefStatus,
    requested: &str,
) -> Result<StatusChange, ValidationError> {
    if requested == current.as_str() {
        return Ok(StatusChange::Unchanged);
    }
    match (current, BriefStatus::parse(requested)) {
        (BriefStatus::Draft, Some(BriefStatus::Live)) => Ok(StatusChange::Publish),
        (BriefStatus::Live, Some(BriefStatus::Withdrawn)) => Ok(StatusChange::Withdraw),
        (BriefStatus::Closed, Some(BriefStatus::Cancelled)) => Ok(StatusChange::Cancel),
        (BriefStatus::Closed, Some(BriefStatus::Unsuccessful)) => {
            Ok(StatusChange::MarkUnsuccessful)
        }
        _ => Err(ValidationError::message(format!(
            "Cannot change brief status from '{current}' to '{requested}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn at(year: i32, month: u32, day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn published(published_at: Timestamp) -> BriefStatusFields {
        BriefStatusFields {
            published_at: Some(published_at),
            applications_closed_at: Some(published_at + Duration::days(14)),
            ..Default::default()
        }
    }

    #[test]
    fn listing_order_matches_declaration() {
        let indices: Vec<i32> = BriefStatus::ALL.iter().map(|s| s.sort_index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(BriefStatus::Live < BriefStatus::Withdrawn);
    }

    #[test]
    fn draft_when_unpublished() {
        let now = at(2020, 1, 1);
        assert_eq!(
            derive_brief_status(&BriefStatusFields::default(), now),
            BriefStatus::Draft
        );
    }

    #[test]
    fn withdrawn_takes_precedence_over_everything() {
        let fields = BriefStatusFields {
            withdrawn_at: Some(at(2020, 1, 2)),
            cancelled_at: Some(at(2020, 1, 3)),
            has_awarded_response: true,
            ..published(at(2020, 1, 1))
        };
        assert_eq!(derive_brief_status(&fields, at(2021, 1, 1)), BriefStatus::Withdrawn);
    }

    #[test]
    fn live_until_applications_close_then_closed() {
        let fields = published(at(2020, 1, 1));
        assert_eq!(derive_brief_status(&fields, at(2020, 1, 5)), BriefStatus::Live);
        assert_eq!(derive_brief_status(&fields, at(2020, 2, 1)), BriefStatus::Closed);
    }

    #[test]
    fn cancelled_and_unsuccessful_beat_awarded() {
        let now = at(2021, 1, 1);
        let cancelled = BriefStatusFields {
            cancelled_at: Some(at(2020, 2, 2)),
            has_awarded_response: true,
            ..published(at(2020, 1, 1))
        };
        let unsuccessful = BriefStatusFields {
            unsuccessful_at: Some(at(2020, 2, 2)),
            ..published(at(2020, 1, 1))
        };
        let awarded = BriefStatusFields {
            has_awarded_response: true,
            ..published(at(2020, 1, 1))
        };

        assert_eq!(derive_brief_status(&cancelled, now), BriefStatus::Cancelled);
        assert_eq!(derive_brief_status(&unsuccessful, now), BriefStatus::Unsuccessful);
        assert_eq!(derive_brief_status(&awarded, now), BriefStatus::Awarded);
    }

    #[test]
    fn permitted_transitions() {
        assert_eq!(
            plan_status_change(BriefStatus::Draft, "live").unwrap(),
            StatusChange::Publish
        );
        assert_eq!(
            plan_status_change(BriefStatus::Live, "withdrawn").unwrap(),
            StatusChange::Withdraw
        );
        assert_eq!(
            plan_status_change(BriefStatus::Closed, "cancelled").unwrap(),
            StatusChange::Cancel
        );
        assert_eq!(
            plan_status_change(BriefStatus::Closed, "unsuccessful").unwrap(),
            StatusChange::MarkUnsuccessful
        );
        for status in BriefStatus::ALL {
            assert_eq!(
                plan_status_change(status, status.as_str()).unwrap(),
                StatusChange::Unchanged
            );
        }
    }

    #[test]
    fn invalid_status_message_is_verbatim() {
        for status in BriefStatus::ALL {
            let err = plan_status_change(status, "invalid").unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Cannot change brief status from '{status}' to 'invalid'")
            );
        }
    }

    #[test]
    fn draft_cannot_skip_to_later_statuses() {
        for requested in ["withdrawn", "closed", "awarded", "cancelled", "unsuccessful"] {
            let err = plan_status_change(BriefStatus::Draft, requested).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Cannot change brief status from 'draft' to '{requested}'")
            );
        }
    }

    #[test]
    fn live_can_only_be_withdrawn() {
        for requested in ["draft", "closed", "awarded", "cancelled", "unsuccessful"] {
            assert!(plan_status_change(BriefStatus::Live, requested).is_err());
        }
    }

    #[test]
    fn withdrawn_is_terminal() {
        for requested in ["draft", "live", "closed", "awarded", "cancelled", "unsuccessful"] {
            let err = plan_status_change(BriefStatus::Withdrawn, requested).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Cannot change brief status from 'withdrawn' to '{requested}'")
            );
        }
    }

    #[test]
    fn awarded_cannot_be_cancelled() {
        assert!(plan_status_change(BriefStatus::Awarded, "cancelled").is_err());
        assert!(plan_status_change(BriefStatus::Live, "cancelled").is_err());
    }
}
