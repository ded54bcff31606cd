//! Buyer requirement postings.
//!
//! A [`Brief`] is only mutated through its guarded methods: the data payload
//! is scrubbed on every write, status changes follow the transition table in
//! [`status`], and the lot is fixed at construction.

pub mod closing;
pub mod copy;
pub mod question;
pub mod status;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::catalog::{Framework, Lot};
use crate::error::ValidationError;
use crate::render::{self, Endpoint, LinkBuilder};
use crate::scrub::{scrub_payload_without, BRIEF_FOREIGN_FIELDS};
use crate::types::{DbId, Timestamp};
use crate::user::User;

pub use closing::ClosingDates;
pub use question::ClarificationQuestion;
pub use status::{derive_brief_status, plan_status_change, BriefStatus, BriefStatusFields, StatusChange};

/// Every stored field of a brief, used to rebuild one loaded from storage.
///
/// No guards run on restore: the stored row already satisfied them.
#[derive(Debug, Clone)]
pub struct BriefRecord {
    pub id: DbId,
    pub framework: Arc<Framework>,
    pub lot: Lot,
    pub data: Value,
    pub users: Vec<User>,
    pub clarification_questions: Vec<ClarificationQuestion>,
    pub published_at: Option<Timestamp>,
    pub withdrawn_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub unsuccessful_at: Option<Timestamp>,
    pub awarded_brief_response_id: Option<DbId>,
    pub is_a_copy: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct Brief {
    id: Option<DbId>,
    framework: Arc<Framework>,
    lot: Lot,
    data: Value,
    users: Vec<User>,
    clarification_questions: Vec<ClarificationQuestion>,
    published_at: Option<Timestamp>,
    withdrawn_at: Option<Timestamp>,
    cancelled_at: Option<Timestamp>,
    unsuccessful_at: Option<Timestamp>,
    awarded_brief_response_id: Option<DbId>,
    is_a_copy: bool,
    created_at: Option<Timestamp>,
    updated_at: Option<Timestamp>,
}

impl Brief {
    /// Create an unsaved draft brief.
    ///
    /// The lot must allow briefs and belong to `framework`; every user must
    /// be a buyer.
    pub fn new(
        framework: Arc<Framework>,
        lot: &Lot,
        data: Value,
        users: Vec<User>,
    ) -> Result<Self, ValidationError> {
        if !lot.allows_brief {
            return Err(ValidationError::message(format!(
                "Lot '{}' does not allow briefs",
                lot.slug
            )));
        }
        if !framework.has_lot(lot.id) {
            return Err(ValidationError::message(format!(
                "Lot '{}' is not part of framework '{}'",
                lot.slug, framework.slug
            )));
        }
        for user in &users {
            check_buyer(user)?;
        }

        Ok(Self {
            id: None,
            framework,
            lot: lot.clone(),
            data: scrub_payload_without(data, BRIEF_FOREIGN_FIELDS),
            users,
            clarification_questions: Vec::new(),
            published_at: None,
            withdrawn_at: None,
            cancelled_at: None,
            unsuccessful_at: None,
            awarded_brief_response_id: None,
            is_a_copy: false,
            created_at: None,
            updated_at: None,
        })
    }

    pub fn from_record(record: BriefRecord) -> Self {
        Self {
            id: Some(record.id),
            framework: record.framework,
            lot: record.lot,
            data: record.data,
            users: record.users,
            clarification_questions: record.clarification_questions,
            published_at: record.published_at,
            withdrawn_at: record.withdrawn_at,
            cancelled_at: record.cancelled_at,
            unsuccessful_at: record.unsuccessful_at,
            awarded_brief_response_id: record.awarded_brief_response_id,
            is_a_copy: record.is_a_copy,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }

    /// Record the identity and timestamps assigned by storage.
    pub fn mark_persisted(&mut self, id: DbId, created_at: Timestamp, updated_at: Timestamp) {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    /// Record the storage id of the clarification question at `index`.
    pub fn mark_question_persisted(&mut self, index: usize, id: DbId) {
        if let Some(question) = self.clarification_questions.get_mut(index) {
            question.id = Some(id);
        }
    }

    // -- accessors ---------------------------------------------------------

    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    pub fn framework(&self) -> &Arc<Framework> {
        &self.framework
    }

    pub fn lot(&self) -> &Lot {
        &self.lot
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn clarification_questions(&self) -> &[ClarificationQuestion] {
        &self.clarification_questions
    }

    pub fn published_at(&self) -> Option<Timestamp> {
        self.published_at
    }

    pub fn withdrawn_at(&self) -> Option<Timestamp> {
        self.withdrawn_at
    }

    pub fn cancelled_at(&self) -> Option<Timestamp> {
        self.cancelled_at
    }

    pub fn unsuccessful_at(&self) -> Option<Timestamp> {
        self.unsuccessful_at
    }

    /// Id of the response holding the award, if the brief has been awarded.
    pub fn awarded_brief_response_id(&self) -> Option<DbId> {
        self.awarded_brief_response_id
    }

    pub fn is_a_copy(&self) -> bool {
        self.is_a_copy
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }

    // -- guarded mutation --------------------------------------------------

    /// Replace the payload. Scrubbed before it is stored.
    pub fn set_data(&mut self, data: Value) {
        self.data = scrub_payload_without(data, BRIEF_FOREIGN_FIELDS);
    }

    /// Merge `patch` into the current payload, then scrub.
    pub fn update_from_json(&mut self, patch: Value) {
        let mut merged = match &self.data {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if let Value::Object(fields) = patch {
            merged.extend(fields);
        }
        self.set_data(Value::Object(merged));
    }

    pub fn add_user(&mut self, user: User) -> Result<(), ValidationError> {
        check_buyer(&user)?;
        if !self.users.iter().any(|existing| existing.id == user.id) {
            self.users.push(user);
        }
        Ok(())
    }

    /// Assign a status directly, applying the matching timestamp side effect.
    pub fn set_status(&mut self, requested: &str) -> Result<(), ValidationError> {
        self.set_status_at(requested, Utc::now())
    }

    pub fn set_status_at(&mut self, requested: &str, now: Timestamp) -> Result<(), ValidationError> {
        match plan_status_change(self.status_at(now), requested)? {
            StatusChange::Unchanged => {}
            StatusChange::Publish => self.published_at = Some(now),
            StatusChange::Withdraw => self.withdrawn_at = Some(now),
            StatusChange::Cancel => self.cancelled_at = Some(now),
            StatusChange::MarkUnsuccessful => self.unsuccessful_at = Some(now),
        }
        Ok(())
    }

    /// Append a clarification question. Only allowed while the brief is live.
    pub fn add_clarification_question(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<&ClarificationQuestion, ValidationError> {
        self.add_clarification_question_at(question, answer, Utc::now())
    }

    pub fn add_clarification_question_at(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
        now: Timestamp,
    ) -> Result<&ClarificationQuestion, ValidationError> {
        let status = self.status_at(now);
        if status != BriefStatus::Live {
            return Err(ValidationError::message(format!(
                "Brief status must be 'live', not '{status}'"
            )));
        }
        let question = ClarificationQuestion::new(question, answer, now)?;
        self.clarification_questions.push(question);
        let last = self.clarification_questions.len() - 1;
        Ok(&self.clarification_questions[last])
    }

    /// Link the response that now holds this brief's award.
    pub(crate) fn set_awarded_brief_response_id(&mut self, id: DbId) {
        self.awarded_brief_response_id = Some(id);
    }

    // -- derived fields ----------------------------------------------------

    pub fn closing_dates(&self) -> Option<ClosingDates> {
        closing::closing_dates(self.published_at, &self.data)
    }

    pub fn applications_closed_at(&self) -> Option<Timestamp> {
        self.closing_dates().map(|d| d.applications_closed_at)
    }

    pub fn clarification_questions_closed_at(&self) -> Option<Timestamp> {
        self.closing_dates()
            .map(|d| d.clarification_questions_closed_at)
    }

    pub fn clarification_questions_published_by(&self) -> Option<Timestamp> {
        self.closing_dates()
            .map(|d| d.clarification_questions_published_by)
    }

    pub fn clarification_questions_are_closed(&self) -> bool {
        self.clarification_questions_are_closed_at(Utc::now())
    }

    pub fn clarification_questions_are_closed_at(&self, now: Timestamp) -> bool {
        self.clarification_questions_closed_at()
            .is_some_and(|closes| now > closes)
    }

    pub fn status_fields(&self) -> BriefStatusFields {
        BriefStatusFields {
            published_at: self.published_at,
            withdrawn_at: self.withdrawn_at,
            cancelled_at: self.cancelled_at,
            unsuccessful_at: self.unsuccessful_at,
            applications_closed_at: self.applications_closed_at(),
            has_awarded_response: self.awarded_brief_response_id.is_some(),
        }
    }

    pub fn status(&self) -> BriefStatus {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: Timestamp) -> BriefStatus {
        derive_brief_status(&self.status_fields(), now)
    }

    // -- serialization -----------------------------------------------------

    /// Summary embedded in serialized brief responses.
    pub fn serialize_summary(&self) -> Value {
        let mut out = Map::new();
        out.insert("id".into(), self.id.into());
        out.insert("title".into(), self.title().into());
        out.insert("status".into(), self.status().as_str().into());
        out.insert("frameworkSlug".into(), self.framework.slug.clone().into());
        out.insert(
            "applicationsClosedAt".into(),
            render::optional_timestamp(self.applications_closed_at().as_ref()),
        );
        Value::Object(out)
    }

    pub fn serialize(&self, links: &dyn LinkBuilder) -> Value {
        let now = Utc::now();
        let status = self.status_at(now);
        let mut out = Map::new();

        out.insert("id".into(), self.id.into());
        out.insert("status".into(), status.as_str().into());
        out.insert("frameworkSlug".into(), self.framework.slug.clone().into());
        out.insert("frameworkFramework".into(), self.framework.family.clone().into());
        out.insert("frameworkName".into(), self.framework.name.clone().into());
        out.insert("frameworkStatus".into(), self.framework.status.as_str().into());
        out.insert("lot".into(), self.lot.slug.clone().into());
        out.insert("lotSlug".into(), self.lot.slug.clone().into());
        out.insert("lotName".into(), self.lot.name.clone().into());
        out.insert("isACopy".into(), self.is_a_copy.into());
        out.insert(
            "createdAt".into(),
            render::optional_timestamp(self.created_at.as_ref()),
        );
        out.insert(
            "updatedAt".into(),
            render::optional_timestamp(self.updated_at.as_ref()),
        );
        out.insert(
            "clarificationQuestions".into(),
            Value::Array(
                self.clarification_questions
                    .iter()
                    .map(ClarificationQuestion::serialize)
                    .collect(),
            ),
        );
        out.insert(
            "users".into(),
            Value::Array(self.users.iter().map(User::serialize_summary).collect()),
        );

        if let (Some(published_at), Some(dates)) = (self.published_at, self.closing_dates()) {
            out.insert("publishedAt".into(), render::timestamp(&published_at).into());
            out.insert(
                "applicationsClosedAt".into(),
                render::timestamp(&dates.applications_closed_at).into(),
            );
            out.insert(
                "clarificationQuestionsClosedAt".into(),
                render::timestamp(&dates.clarification_questions_closed_at).into(),
            );
            out.insert(
                "clarificationQuestionsPublishedBy".into(),
                render::timestamp(&dates.clarification_questions_published_by).into(),
            );
            out.insert(
                "clarificationQuestionsAreClosed".into(),
                self.clarification_questions_are_closed_at(now).into(),
            );
        }
        for (key, value) in [
            ("withdrawnAt", self.withdrawn_at),
            ("cancelledAt", self.cancelled_at),
            ("unsuccessfulAt", self.unsuccessful_at),
        ] {
            if let Some(ts) = value {
                out.insert(key.into(), render::timestamp(&ts).into());
            }
        }
        if status == BriefStatus::Awarded {
            out.insert(
                "awardedBriefResponseId".into(),
                self.awarded_brief_response_id.into(),
            );
        }

        out.insert(
            "links".into(),
            render::links(
                links,
                &[
                    ("self", self.id.map(Endpoint::Brief)),
                    ("framework", Some(Endpoint::Framework(&self.framework.slug))),
                ],
            ),
        );

        render::merge_data_under(&mut out, &self.data);
        Value::Object(out)
    }
}

fn check_buyer(user: &User) -> Result<(), ValidationError> {
    if !user.is_buyer() {
        return Err(ValidationError::message(format!(
            "The brief user must be a buyer, not '{}'",
            user.role
        )));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::fixtures::*;
    use super::*;
    use crate::render::BaseUrlLinks;

    fn draft() -> Brief {
        let framework = dos();
        let lot = framework.get_lot("digital-outcomes").cloned().unwrap();
        Brief::new(framework, &lot, json!({}), Vec::new()).unwrap()
    }

    fn long_ago() -> Timestamp {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn new_brief_is_an_unsaved_draft() {
        let brief = draft();
        assert_eq!(brief.id(), None);
        assert_eq!(brief.status(), BriefStatus::Draft);
        assert_eq!(brief.data(), &json!({}));
        assert!(!brief.is_a_copy());
        assert_eq!(brief.applications_closed_at(), None);
        assert!(!brief.clarification_questions_are_closed());
    }

    #[test]
    fn lot_must_allow_briefs() {
        let framework = dos();
        let lot = framework.get_lot("user-research-studios").cloned().unwrap();
        let err = Brief::new(framework, &lot, json!({}), Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Lot 'user-research-studios' does not allow briefs");
    }

    #[test]
    fn lot_must_belong_to_framework() {
        let mut lot = dos().get_lot("digital-outcomes").cloned().unwrap();
        lot.id = 99;
        let err = Brief::new(dos(), &lot, json!({}), Vec::new()).unwrap_err();
        assert!(err.to_string().contains("is not part of framework"));
    }

    #[test]
    fn only_buyers_can_be_attached() {
        let framework = dos();
        let lot = framework.get_lot("digital-outcomes").cloned().unwrap();
        let brief = Brief::new(framework.clone(), &lot, json!({}), vec![buyer(1)]).unwrap();
        assert_eq!(brief.users().len(), 1);

        let admin = User {
            role: "admin".to_string(),
            ..buyer(2)
        };
        let err = Brief::new(framework, &lot, json!({}), vec![admin.clone()]).unwrap_err();
        assert_eq!(err.to_string(), "The brief user must be a buyer, not 'admin'");

        let mut brief = brief;
        assert!(brief.add_user(admin).is_err());
        brief.add_user(buyer(1)).unwrap();
        assert_eq!(brief.users().len(), 1);
    }

    #[test]
    fn data_is_scrubbed_on_write() {
        let mut brief = draft();
        brief.set_data(json!({
            "frameworkSlug": "test",
            "frameworkName": "test",
            "lot": "test",
            "lotName": "test",
            "title": "test",
        }));
        assert_eq!(brief.data(), &json!({"title": "test"}));

        brief.set_data(json!({"foo": "bar", "bar": null}));
        assert_eq!(brief.data(), &json!({"foo": "bar"}));

        brief.set_data(json!({"foo": " bar ", "bar": "", "other": "  "}));
        assert_eq!(brief.data(), &json!({"foo": "bar", "bar": "", "other": ""}));
    }

    #[test]
    fn restored_data_is_not_scrubbed() {
        let brief = Brief::from_record(record(dos(), json!({"title": " padded ", "lot": "x"})));
        assert_eq!(brief.data(), &json!({"title": " padded ", "lot": "x"}));
    }

    #[test]
    fn update_from_json_merges() {
        let mut brief = draft();
        brief.update_from_json(json!({"foo": "bar"}));
        brief.update_from_json(json!({"baz": " qux "}));
        assert_eq!(brief.data(), &json!({"foo": "bar", "baz": "qux"}));
    }

    #[test]
    fn live_status_for_briefs_with_published_at() {
        assert_eq!(published_brief(Utc::now()).status(), BriefStatus::Live);
    }

    #[test]
    fn closed_status_for_a_brief_with_passed_close_date() {
        let brief = published_brief(Utc::now() - Duration::days(1000));
        assert_eq!(brief.status(), BriefStatus::Closed);
        assert!(brief.clarification_questions_are_closed());
        assert!(brief.applications_closed_at().unwrap() < Utc::now());
    }

    #[test]
    fn awarded_status_when_a_response_holds_the_award() {
        let mut brief = published_brief(long_ago());
        brief.set_awarded_brief_response_id(7);
        assert_eq!(brief.status(), BriefStatus::Awarded);
    }

    #[test]
    fn publishing_sets_published_at() {
        let mut brief = draft();
        brief.set_status("live").unwrap();
        assert!(brief.published_at().is_some());
        assert_eq!(brief.status(), BriefStatus::Live);
        assert!(!brief.clarification_questions_are_closed());
    }

    #[test]
    fn withdrawing_sets_withdrawn_at_and_keeps_published_at() {
        let mut brief = published_brief(Utc::now());
        brief.set_status("withdrawn").unwrap();
        assert!(brief.published_at().is_some());
        assert!(brief.withdrawn_at().is_some());
        assert_eq!(brief.status(), BriefStatus::Withdrawn);
    }

    #[test]
    fn cancelling_and_unsuccessful_require_closed() {
        let mut brief = published_brief(long_ago());
        brief.set_status("cancelled").unwrap();
        assert!(brief.cancelled_at().is_some());

        let mut brief = published_brief(long_ago());
        brief.set_status("unsuccessful").unwrap();
        assert!(brief.unsuccessful_at().is_some());

        let mut live = published_brief(Utc::now());
        assert!(live.set_status("cancelled").is_err());
        assert_eq!(live.cancelled_at(), None);
    }

    #[test]
    fn same_status_is_a_no_op() {
        let mut brief = draft();
        brief.set_status("draft").unwrap();
        assert_eq!(brief.published_at(), None);
    }

    #[test]
    fn invalid_status_fails_with_exact_message() {
        let mut brief = draft();
        let err = brief.set_status("invalid").unwrap_err();
        assert_eq!(
            err.as_message(),
            Some("Cannot change brief status from 'draft' to 'invalid'")
        );
    }

    #[test]
    fn clarification_questions_only_on_live_briefs() {
        let mut brief = draft();
        let err = brief.add_clarification_question("Why?", "Because").unwrap_err();
        assert_eq!(err.to_string(), "Brief status must be 'live', not 'draft'");
        assert!(brief.clarification_questions().is_empty());
    }

    #[test]
    fn clarification_questions_append_in_order() {
        let mut brief = published_brief(Utc::now());
        brief.add_clarification_question("How?", "This").unwrap();
        brief.add_clarification_question("When", "Then").unwrap();

        let questions = brief.clarification_questions();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "How?");
        assert_eq!(questions[1].question, "When");
    }

    #[test]
    fn invalid_clarification_question_is_not_appended() {
        let mut brief = published_brief(Utc::now());
        let err = brief.add_clarification_question("", "This").unwrap_err();
        assert_eq!(err.field_code("question"), Some("answer_required"));
        assert!(brief.clarification_questions().is_empty());
    }

    #[test]
    fn serialize_includes_dates_only_when_published() {
        let links = BaseUrlLinks::new("http://api.test");
        let draft = draft().serialize(&links);
        assert_eq!(draft["status"], "draft");
        assert!(draft.get("applicationsClosedAt").is_none());
        assert!(draft["links"].get("self").is_none());

        let closed = published_brief(long_ago()).serialize(&links);
        assert_eq!(closed["status"], "closed");
        assert_eq!(closed["applicationsClosedAt"], "2000-01-15T23:59:59.000000Z");
        assert_eq!(closed["clarificationQuestionsAreClosed"], true);
        assert_eq!(closed["links"]["self"], "http://api.test/briefs/1");
        assert!(closed.get("awardedBriefResponseId").is_none());
    }

    #[test]
    fn serialize_includes_awarded_response_id_when_awarded() {
        let links = BaseUrlLinks::new("http://api.test");
        let mut brief = published_brief(long_ago());
        brief.set_awarded_brief_response_id(42);
        let rendered = brief.serialize(&links);
        assert_eq!(rendered["status"], "awarded");
        assert_eq!(rendered["awardedBriefResponseId"], 42);
    }

    #[test]
    fn serialize_keeps_data_keys_without_overriding_server_fields() {
        let links = BaseUrlLinks::new("http://api.test");
        let brief = Brief::from_record(record(dos(), json!({"title": "t", "status": "bogus"})));
        let rendered = brief.serialize(&links);
        assert_eq!(rendered["title"], "t");
        assert_eq!(rendered["status"], "draft");
    }
}
