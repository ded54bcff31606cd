//! Duplicating a brief as a fresh draft.

use serde_json::Value;

use super::Brief;
use crate::catalog::Catalog;
use crate::error::ValidationError;

/// Keys that describe the original's framework, lot or schedule and must not
/// carry over to the copy.
pub const COPY_DROPPED_FIELDS: &[&str] = &[
    "frameworkSlug",
    "frameworkName",
    "lot",
    "lotName",
    "startDate",
    "questionAndAnswerSessionDetails",
    "researchDates",
];

/// Titles longer than this are copied unchanged.
pub const MAX_TITLE_FOR_SUFFIX: usize = 95;

pub const COPY_SUFFIX: &str = " copy";

impl Brief {
    /// Create an unsaved draft with this brief's data and users.
    ///
    /// The copy stays on the same framework while it is live. Otherwise it
    /// moves to the live framework of the same family, onto the lot with the
    /// same slug.
    pub fn copy(&self, catalog: &Catalog) -> Result<Brief, ValidationError> {
        let framework = if self.framework.is_live() {
            self.framework.clone()
        } else {
            catalog
                .live_framework(&self.framework.family)
                .cloned()
                .ok_or_else(|| {
                    ValidationError::message(format!(
                        "No live framework to copy brief to from '{}'",
                        self.framework.slug
                    ))
                })?
        };
        let lot = framework.get_lot(&self.lot.slug).cloned().ok_or_else(|| {
            ValidationError::message(format!(
                "Lot '{}' is not part of framework '{}'",
                self.lot.slug, framework.slug
            ))
        })?;

        let mut brief = Brief::new(framework, &lot, copied_data(&self.data), self.users.clone())?;
        brief.is_a_copy = true;
        Ok(brief)
    }
}

fn copied_data(data: &Value) -> Value {
    let mut data = data.clone();
    if let Value::Object(fields) = &mut data {
        for key in COPY_DROPPED_FIELDS {
            fields.remove(*key);
        }
        if let Some(Value::String(title)) = fields.get_mut("title") {
            if title.chars().count() <= MAX_TITLE_FOR_SUFFIX {
                title.push_str(COPY_SUFFIX);
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::*;
    use crate::brief::fixtures::{buyer, dos, record};
    use crate::brief::{BriefRecord, BriefStatus};
    use crate::catalog::fixtures::dos_framework;
    use crate::catalog::FrameworkStatus;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            dos_framework(4, "digital-outcomes-and-specialists-1", FrameworkStatus::Expired),
            dos_framework(5, "digital-outcomes-and-specialists", FrameworkStatus::Live),
        ])
    }

    fn closed_brief(framework_id: i64, slug: &str, status: FrameworkStatus, data: Value) -> Brief {
        let framework = Arc::new(dos_framework(framework_id, slug, status));
        let mut brief = Brief::from_record(BriefRecord {
            published_at: Some(Utc::now() - Duration::days(30)),
            ..record(framework, data)
        });
        brief.add_user(buyer(3)).unwrap();
        brief
    }

    #[test]
    fn copy_is_an_unsaved_draft_flagged_as_copy() {
        let original = closed_brief(
            5,
            "digital-outcomes-and-specialists",
            FrameworkStatus::Live,
            json!({"title": "Tea"}),
        );
        let copy = original.copy(&catalog()).unwrap();

        assert_eq!(copy.id(), None);
        assert_eq!(copy.status(), BriefStatus::Draft);
        assert!(copy.is_a_copy());
        assert_eq!(copy.published_at(), None);
        assert_eq!(copy.users(), original.users());
        assert!(copy.clarification_questions().is_empty());
        assert_eq!(copy.title(), Some("Tea copy"));
        assert_eq!(copy.framework().id, 5);
    }

    #[test]
    fn copy_drops_framework_and_schedule_keys() {
        let original = closed_brief(
            5,
            "digital-outcomes-and-specialists",
            FrameworkStatus::Live,
            json!({
                "title": "x",
                "frameworkSlug": "a",
                "frameworkName": "b",
                "lot": "c",
                "lotName": "d",
                "startDate": "e",
                "questionAndAnswerSessionDetails": "f",
                "researchDates": "g",
                "location": "London",
            }),
        );
        let copy = original.copy(&catalog()).unwrap();
        assert_eq!(copy.data(), &json!({"title": "x copy", "location": "London"}));
    }

    #[test]
    fn title_suffix_boundary() {
        for (len, expected_suffix) in [(95, true), (96, false)] {
            let title = "t".repeat(len);
            let original = closed_brief(
                5,
                "digital-outcomes-and-specialists",
                FrameworkStatus::Live,
                json!({ "title": title }),
            );
            let copy = original.copy(&catalog()).unwrap();
            let expected = if expected_suffix {
                format!("{title} copy")
            } else {
                title.clone()
            };
            assert_eq!(copy.title(), Some(expected.as_str()));
        }
    }

    #[test]
    fn copy_of_expired_framework_moves_to_live_family_member() {
        let original = closed_brief(
            4,
            "digital-outcomes-and-specialists-1",
            FrameworkStatus::Expired,
            json!({}),
        );
        let copy = original.copy(&catalog()).unwrap();
        assert_eq!(copy.framework().slug, "digital-outcomes-and-specialists");
        assert_eq!(copy.lot().slug, original.lot().slug);
    }

    #[test]
    fn copy_fails_without_live_successor() {
        let original = closed_brief(
            4,
            "digital-outcomes-and-specialists-1",
            FrameworkStatus::Expired,
            json!({}),
        );
        let only_expired = Catalog::new(vec![dos_framework(
            4,
            "digital-outcomes-and-specialists-1",
            FrameworkStatus::Expired,
        )]);
        let err = original.copy(&only_expired).unwrap_err();
        assert!(err.to_string().starts_with("No live framework"));
    }

    #[test]
    fn copy_keeps_live_framework_even_if_catalog_differs() {
        let original = Brief::from_record(record(dos(), json!({"title": "a"})));
        let copy = original.copy(&Catalog::default()).unwrap();
        assert_eq!(copy.framework().slug, "digital-outcomes-and-specialists");
    }
}
