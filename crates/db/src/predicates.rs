//! SQL mirrors of the derived status fields in `marketplace_core`.
//!
//! Every expression here must select exactly the rows whose in-process
//! status matches. The table aliases are fixed: `b` for `briefs`, `br` for
//! `brief_responses` and `fa` for `framework_agreements`.
//!
//! The integration tests in `tests/status_predicates.rs` compare each
//! expression with the in-process derivation row by row.

macro_rules! brief_applications_closed_at {
    () => {
        "((date_trunc('day', (b.published_at AT TIME ZONE 'UTC') \
         + CASE WHEN b.data->>'requirementsLength' = '1 week' \
                THEN INTERVAL '7 days' ELSE INTERVAL '14 days' END) \
         + INTERVAL '23 hours 59 minutes 59 seconds') AT TIME ZONE 'UTC')"
    };
}

macro_rules! brief_awarded_response_id {
    () => {
        "(SELECT award.id FROM brief_responses award \
          WHERE award.brief_id = b.id AND award.awarded_at IS NOT NULL)"
    };
}

macro_rules! brief_status {
    () => {
        concat!(
            "CASE WHEN b.withdrawn_at IS NOT NULL THEN 'withdrawn' \
                  WHEN b.published_at IS NULL THEN 'draft' \
                  WHEN b.cancelled_at IS NOT NULL THEN 'cancelled' \
                  WHEN b.unsuccessful_at IS NOT NULL THEN 'unsuccessful' \
                  WHEN ",
            brief_awarded_response_id!(),
            " IS NOT NULL THEN 'awarded' \
                  WHEN NOW() < ",
            brief_applications_closed_at!(),
            " THEN 'live' \
                  ELSE 'closed' END"
        )
    };
}

/// End of the application window; NULL for drafts.
pub const BRIEF_APPLICATIONS_CLOSED_AT: &str = brief_applications_closed_at!();

/// Id of the response holding the brief's award, if any.
pub const BRIEF_AWARDED_RESPONSE_ID: &str = brief_awarded_response_id!();

/// Derived brief status as text.
pub const BRIEF_STATUS: &str = brief_status!();

/// Position of the derived brief status in default listings.
pub const BRIEF_STATUS_ORDER: &str = concat!(
    "CASE ",
    brief_status!(),
    " WHEN 'live' THEN 0 \
      WHEN 'closed' THEN 1 \
      WHEN 'awarded' THEN 2 \
      WHEN 'cancelled' THEN 3 \
      WHEN 'unsuccessful' THEN 4 \
      WHEN 'draft' THEN 5 \
      WHEN 'withdrawn' THEN 6 END"
);

/// Derived brief response status as text.
pub const BRIEF_RESPONSE_STATUS: &str = "CASE \
    WHEN br.awarded_at IS NOT NULL THEN 'awarded' \
    WHEN br.award_details @> '{\"pending\": true}'::jsonb THEN 'pending-awarded' \
    WHEN br.submitted_at IS NOT NULL THEN 'submitted' \
    ELSE 'draft' END";

/// Derived framework agreement status as text.
pub const AGREEMENT_STATUS: &str = "CASE \
    WHEN fa.signed_agreement_returned_at IS NULL THEN 'draft' \
    WHEN fa.countersigned_agreement_returned_at IS NOT NULL \
         AND fa.countersigned_agreement_path IS NOT NULL THEN 'countersigned' \
    WHEN fa.countersigned_agreement_returned_at IS NOT NULL THEN 'approved' \
    WHEN fa.signed_agreement_put_on_hold_at IS NOT NULL THEN 'on-hold' \
    ELSE 'signed' END";

pub const AGREEMENT_MOST_RECENT_SIGNATURE_TIME: &str =
    "COALESCE(fa.countersigned_agreement_returned_at, fa.signed_agreement_returned_at)";

#[cfg(test)]
mod tests {
    use marketplace_core::agreement::AgreementStatus;
    use marketplace_core::brief::BriefStatus;
    use marketplace_core::brief_response::BriefResponseStatus;

    use super::*;

    #[test]
    fn status_order_matches_listing_order() {
        for status in BriefStatus::ALL {
            let clause = format!("WHEN '{}' THEN {}", status.as_str(), status.sort_index());
            assert!(
                BRIEF_STATUS_ORDER.contains(&clause),
                "missing order clause {clause}"
            );
        }
    }

    #[test]
    fn every_status_is_producible() {
        for status in BriefStatus::ALL {
            assert!(BRIEF_STATUS.contains(&format!("'{}'", status.as_str())));
        }
        for status in BriefResponseStatus::ALL {
            assert!(BRIEF_RESPONSE_STATUS.contains(&format!("'{}'", status.as_str())));
        }
        for status in AgreementStatus::ALL {
            assert!(AGREEMENT_STATUS.contains(&format!("'{}'", status.as_str())));
        }
    }

    #[test]
    fn status_embeds_closing_date() {
        assert!(BRIEF_STATUS.contains(BRIEF_APPLICATIONS_CLOSED_AT));
        assert!(BRIEF_STATUS.contains(BRIEF_AWARDED_RESPONSE_ID));
    }
}
