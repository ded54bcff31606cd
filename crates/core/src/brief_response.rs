//! Supplier responses to briefs and the award workflow.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::brief::{Brief, BriefStatus};
use crate::error::ValidationError;
use crate::render::{self, Endpoint, LinkBuilder};
use crate::scrub::{scrub_payload_without, BRIEF_RESPONSE_FOREIGN_FIELDS};
use crate::types::{DbId, SupplierId, Timestamp};

pub const AWARD_CHANGE_FORBIDDEN: &str =
    "Cannot remove or change award datestamp on previously awarded Brief Response";
pub const AWARD_DETAILS_CHANGE_FORBIDDEN: &str =
    "Cannot remove or change award details on previously awarded Brief Response";
pub const BRIEF_NOT_CLOSED: &str = "Brief response can not be awarded if the brief is not closed";
pub const RESPONSE_NOT_SUBMITTED: &str =
    "Brief response can not be awarded if response has not been submitted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BriefResponseStatus {
    Draft,
    Submitted,
    PendingAwarded,
    Awarded,
}

impl BriefResponseStatus {
    pub const ALL: [BriefResponseStatus; 4] = [
        BriefResponseStatus::Draft,
        BriefResponseStatus::Submitted,
        BriefResponseStatus::PendingAwarded,
        BriefResponseStatus::Awarded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BriefResponseStatus::Draft => "draft",
            BriefResponseStatus::Submitted => "submitted",
            BriefResponseStatus::PendingAwarded => "pending-awarded",
            BriefResponseStatus::Awarded => "awarded",
        }
    }
}

impl fmt::Display for BriefResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BriefResponseStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| {
                ValidationError::message(format!("Invalid brief response status '{value}'"))
            })
    }
}

/// `awarded_at` wins, then a pending award marker, then submission.
pub fn derive_brief_response_status(
    submitted_at: Option<Timestamp>,
    awarded_at: Option<Timestamp>,
    award_details: &Value,
) -> BriefResponseStatus {
    if awarded_at.is_some() {
        BriefResponseStatus::Awarded
    } else if is_pending_award(award_details) {
        BriefResponseStatus::PendingAwarded
    } else if submitted_at.is_some() {
        BriefResponseStatus::Submitted
    } else {
        BriefResponseStatus::Draft
    }
}

fn is_pending_award(award_details: &Value) -> bool {
    award_details.get("pending") == Some(&Value::Bool(true))
}

fn is_empty_details(details: &Value) -> bool {
    match details {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Stored fields of a response, used to rebuild one loaded from storage.
#[derive(Debug, Clone)]
pub struct BriefResponseRecord {
    pub id: DbId,
    pub brief_id: DbId,
    pub supplier_id: SupplierId,
    pub data: Value,
    pub award_details: Value,
    pub submitted_at: Option<Timestamp>,
    pub awarded_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BriefResponse {
    id: Option<DbId>,
    brief_id: DbId,
    supplier_id: SupplierId,
    data: Value,
    award_details: Value,
    submitted_at: Option<Timestamp>,
    awarded_at: Option<Timestamp>,
    created_at: Option<Timestamp>,
}

/// Supplier fields shown alongside a serialized response.
#[derive(Debug, Clone, Copy)]
pub struct SupplierSummary<'a> {
    pub name: &'a str,
    /// Taken from the supplier's declaration on the brief's framework.
    pub organisation_size: Option<&'a str>,
}

impl BriefResponse {
    pub fn new(brief_id: DbId, supplier_id: SupplierId, data: Value) -> Self {
        Self {
            id: None,
            brief_id,
            supplier_id,
            data: scrub_payload_without(data, BRIEF_RESPONSE_FOREIGN_FIELDS),
            award_details: json!({}),
            submitted_at: None,
            awarded_at: None,
            created_at: None,
        }
    }

    pub fn from_record(record: BriefResponseRecord) -> Self {
        Self {
            id: Some(record.id),
            brief_id: record.brief_id,
            supplier_id: record.supplier_id,
            data: record.data,
            award_details: record.award_details,
            submitted_at: record.submitted_at,
            awarded_at: record.awarded_at,
            created_at: Some(record.created_at),
        }
    }

    pub fn mark_persisted(&mut self, id: DbId, created_at: Timestamp) {
        self.id = Some(id);
        self.created_at = Some(created_at);
    }

    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    pub fn brief_id(&self) -> DbId {
        self.brief_id
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn award_details(&self) -> &Value {
        &self.award_details
    }

    pub fn submitted_at(&self) -> Option<Timestamp> {
        self.submitted_at
    }

    pub fn awarded_at(&self) -> Option<Timestamp> {
        self.awarded_at
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    pub fn status(&self) -> BriefResponseStatus {
        derive_brief_response_status(self.submitted_at, self.awarded_at, &self.award_details)
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = scrub_payload_without(data, BRIEF_RESPONSE_FOREIGN_FIELDS);
    }

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

    pub fn submit(&mut self) -> Result<(), ValidationError> {
        self.submit_at(Utc::now())
    }

    pub fn submit_at(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        if self.submitted_at.is_some() {
            return Err(ValidationError::message(
                "Brief response has already been submitted",
            ));
        }
        self.submitted_at = Some(now);
        Ok(())
    }

    /// Check an `awarded_at` assignment against the award rules.
    ///
    /// `brief` must be this response's parent; its status is derived at the
    /// current time. Re-assigning the value already stored is accepted.
    pub fn check_awarded_at(
        &self,
        awarded_at: Option<Timestamp>,
        brief: &Brief,
    ) -> Result<(), ValidationError> {
        if self.awarded_at == awarded_at {
            return Ok(());
        }
        if self.awarded_at.is_some() {
            return Err(ValidationError::message(AWARD_CHANGE_FORBIDDEN));
        }
        if awarded_at.is_some() {
            self.check_awardable(brief)?;
        }
        Ok(())
    }

    fn check_awardable(&self, brief: &Brief) -> Result<(), ValidationError> {
        if brief.id() != Some(self.brief_id) {
            return Err(ValidationError::message(format!(
                "Brief response does not belong to brief {}",
                brief.id().map_or_else(|| "(unsaved)".to_string(), |id| id.to_string())
            )));
        }
        if brief.status() != BriefStatus::Closed {
            return Err(ValidationError::message(BRIEF_NOT_CLOSED));
        }
        if self.submitted_at.is_none() {
            return Err(ValidationError::message(RESPONSE_NOT_SUBMITTED));
        }
        Ok(())
    }

    pub fn set_awarded_at(
        &mut self,
        awarded_at: Option<Timestamp>,
        brief: &Brief,
    ) -> Result<(), ValidationError> {
        self.check_awarded_at(awarded_at, brief)?;
        self.awarded_at = awarded_at;
        Ok(())
    }

    /// Replace the award details. They are frozen once `awarded_at` is set.
    pub fn set_award_details(&mut self, details: Value) -> Result<(), ValidationError> {
        let details = match details {
            Value::Null => json!({}),
            other => other,
        };
        if self.awarded_at.is_some() && details != self.award_details {
            return Err(ValidationError::message(AWARD_DETAILS_CHANGE_FORBIDDEN));
        }
        self.award_details = details;
        Ok(())
    }

    /// Mark this response as the buyer's chosen supplier ahead of the award.
    pub fn mark_pending_award(&mut self, brief: &Brief) -> Result<(), ValidationError> {
        if self.awarded_at.is_some() {
            return Err(ValidationError::message(AWARD_DETAILS_CHANGE_FORBIDDEN));
        }
        self.check_awardable(brief)?;
        self.award_details = json!({"pending": true});
        Ok(())
    }

    pub fn clear_pending_award(&mut self) -> Result<(), ValidationError> {
        self.set_award_details(json!({}))
    }

    /// Award this response, recording the award on `brief` as well.
    ///
    /// The brief must be closed now; `awarded_at` is stored as given. Every
    /// rule is checked before either entity changes.
    pub fn award(
        &mut self,
        brief: &mut Brief,
        award_details: Value,
        awarded_at: Timestamp,
    ) -> Result<(), ValidationError> {
        let id = self.id.ok_or_else(|| {
            ValidationError::message("Brief response must be saved before it can be awarded")
        })?;
        if is_empty_details(&award_details) {
            return Err(ValidationError::message("Award details are required"));
        }
        self.check_awarded_at(Some(awarded_at), brief)?;

        self.award_details = award_details;
        self.awarded_at = Some(awarded_at);
        brief.set_awarded_brief_response_id(id);
        Ok(())
    }

    pub fn serialize(
        &self,
        brief: &Brief,
        supplier: SupplierSummary<'_>,
        links: &dyn LinkBuilder,
    ) -> Value {
        let status = self.status();
        let mut out = Map::new();

        out.insert("id".into(), self.id.into());
        out.insert("briefId".into(), self.brief_id.into());
        out.insert("brief".into(), brief.serialize_summary());
        out.insert("supplierId".into(), self.supplier_id.into());
        out.insert("supplierName".into(), supplier.name.into());
        out.insert(
            "supplierOrganisationSize".into(),
            supplier.organisation_size.into(),
        );
        out.insert(
            "createdAt".into(),
            render::optional_timestamp(self.created_at.as_ref()),
        );
        if let Some(submitted_at) = self.submitted_at {
            out.insert("submittedAt".into(), render::timestamp(&submitted_at).into());
        }
        out.insert("status".into(), status.as_str().into());
        if matches!(
            status,
            BriefResponseStatus::Awarded | BriefResponseStatus::PendingAwarded
        ) {
            out.insert("awardDetails".into(), self.award_details.clone());
        }
        if let Some(awarded_at) = self.awarded_at {
            out.insert("awardedAt".into(), render::timestamp(&awarded_at).into());
        }
        out.insert(
            "links".into(),
            render::links(
                links,
                &[
                    ("self", self.id.map(Endpoint::BriefResponse)),
                    ("brief", Some(Endpoint::Brief(self.brief_id))),
                    ("supplier", Some(Endpoint::Supplier(self.supplier_id))),
                ],
            ),
        );

        render::merge_data_under(&mut out, &self.data);
        Value::Object(out)
    }
}

impl Brief {
    /// The response among `responses` holding this brief's award.
    pub fn awarded_brief_response<'a>(
        &self,
        responses: &'a [BriefResponse],
    ) -> Option<&'a BriefResponse> {
        let id = self.id()?;
        responses
            .iter()
            .find(|response| response.brief_id == id && response.awarded_at.is_some())
    }
}
