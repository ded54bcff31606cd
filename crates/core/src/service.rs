//! Supplier service listings and their archived snapshots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{Framework, Lot};
use crate::error::ValidationError;
use crate::render::{self, Endpoint, LinkBuilder};
use crate::types::{DbId, SupplierId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Disabled,
    Enabled,
    Published,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 3] = [
        ServiceStatus::Disabled,
        ServiceStatus::Enabled,
        ServiceStatus::Published,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::Disabled => "disabled",
            ServiceStatus::Enabled => "enabled",
            ServiceStatus::Published => "published",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::message(format!("Invalid service status value '{value}'")))
    }
}

/// Stored fields of a service or archived service row.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    pub id: DbId,
    pub service_id: String,
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub lot_id: DbId,
    pub data: Value,
    pub status: ServiceStatus,
    pub updated_by: String,
    pub updated_reason: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Related names shown alongside a serialized service.
#[derive(Debug, Clone, Copy)]
pub struct ServiceContext<'a> {
    pub supplier_name: &'a str,
    pub framework: &'a Framework,
    pub lot: &'a Lot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    id: Option<DbId>,
    service_id: String,
    supplier_id: SupplierId,
    framework_id: DbId,
    lot_id: DbId,
    data: Value,
    status: ServiceStatus,
    updated_by: String,
    updated_reason: String,
    created_at: Option<Timestamp>,
    updated_at: Option<Timestamp>,
}

impl Service {
    /// Create an unsaved service. The lot must be part of `framework`.
    pub fn new(
        service_id: impl Into<String>,
        supplier_id: SupplierId,
        framework: &Framework,
        lot: &Lot,
        data: Value,
        status: &str,
    ) -> Result<Self, ValidationError> {
        if !framework.has_lot(lot.id) {
            return Err(ValidationError::message(format!(
                "Lot '{}' is not part of framework '{}'",
                lot.slug, framework.slug
            )));
        }
        Ok(Self {
            id: None,
            service_id: service_id.into(),
            supplier_id,
            framework_id: framework.id,
            lot_id: lot.id,
            data,
            status: status.parse()?,
            updated_by: String::new(),
            updated_reason: String::new(),
            created_at: None,
            updated_at: None,
        })
    }

    pub fn from_record(record: ServiceRecord) -> Self {
        Self {
            id: Some(record.id),
            service_id: record.service_id,
            supplier_id: record.supplier_id,
            framework_id: record.framework_id,
            lot_id: record.lot_id,
            data: record.data,
            status: record.status,
            updated_by: record.updated_by,
            updated_reason: record.updated_reason,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }

    pub fn mark_persisted(&mut self, id: DbId, created_at: Timestamp, updated_at: Timestamp) {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn framework_id(&self) -> DbId {
        self.framework_id
    }

    pub fn lot_id(&self) -> DbId {
        self.lot_id
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn updated_by(&self) -> &str {
        &self.updated_by
    }

    pub fn updated_reason(&self) -> &str {
        &self.updated_reason
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    pub fn set_status(&mut self, status: &str) -> Result<(), ValidationError> {
        self.status = status.parse()?;
        Ok(())
    }

    /// Merge `patch` into the data payload.
    pub fn update_from_json(&mut self, patch: Value) {
        let mut merged = match std::mem::take(&mut self.data) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Value::Object(fields) = patch {
            merged.extend(fields);
        }
        self.data = Value::Object(merged);
    }

    /// Who changed the service and why, recorded with the next save.
    pub fn set_audit(&mut self, updated_by: impl Into<String>, updated_reason: impl Into<String>) {
        self.updated_by = updated_by.into();
        self.updated_reason = updated_reason.into();
    }

    pub fn serialize(&self, context: ServiceContext<'_>, links: &dyn LinkBuilder) -> Value {
        serialize_listing(
            ListingFields {
                service_id: &self.service_id,
                supplier_id: self.supplier_id,
                data: &self.data,
                status: self.status,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            context,
            links,
        )
    }
}

/// Immutable snapshot of a service taken when it is superseded.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedService {
    pub id: Option<DbId>,
    pub service_id: String,
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub lot_id: DbId,
    pub data: Value,
    pub status: ServiceStatus,
    pub updated_by: String,
    pub updated_reason: String,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl ArchivedService {
    pub fn from_service(service: &Service) -> Self {
        Self {
            id: None,
            service_id: service.service_id.clone(),
            supplier_id: service.supplier_id,
            framework_id: service.framework_id,
            lot_id: service.lot_id,
            data: service.data.clone(),
            status: service.status,
            updated_by: service.updated_by.clone(),
            updated_reason: service.updated_reason.clone(),
            created_at: service.created_at,
            updated_at: service.updated_at,
        }
    }

    pub fn from_record(record: ServiceRecord) -> Self {
        Self {
            id: Some(record.id),
            service_id: record.service_id,
            supplier_id: record.supplier_id,
            framework_id: record.framework_id,
            lot_id: record.lot_id,
            data: record.data,
            status: record.status,
            updated_by: record.updated_by,
            updated_reason: record.updated_reason,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }

    pub fn serialize(&self, context: ServiceContext<'_>, links: &dyn LinkBuilder) -> Value {
        serialize_listing(
            ListingFields {
                service_id: &self.service_id,
                supplier_id: self.supplier_id,
                data: &self.data,
                status: self.status,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            context,
            links,
        )
    }
}

struct ListingFields<'a> {
    service_id: &'a str,
    supplier_id: SupplierId,
    data: &'a Value,
    status: ServiceStatus,
    created_at: Option<Timestamp>,
    updated_at: Option<Timestamp>,
}

fn serialize_listing(
    fields: ListingFields<'_>,
    context: ServiceContext<'_>,
    links: &dyn LinkBuilder,
) -> Value {
    let mut out = Map::new();
    out.insert("id".into(), fields.service_id.into());
    out.insert("supplierId".into(), fields.supplier_id.into());
    out.insert("supplierName".into(), context.supplier_name.into());
    out.insert("frameworkSlug".into(), context.framework.slug.clone().into());
    out.insert("frameworkFramework".into(), context.framework.family.clone().into());
    out.insert("frameworkName".into(), context.framework.name.clone().into());
    out.insert("frameworkStatus".into(), context.framework.status.as_str().into());
    out.insert("lot".into(), context.lot.slug.clone().into());
    out.insert("lotSlug".into(), context.lot.slug.clone().into());
    out.insert("lotName".into(), context.lot.name.clone().into());
    out.insert("status".into(), fields.status.as_str().into());
    out.insert(
        "createdAt".into(),
        render::optional_timestamp(fields.created_at.as_ref()),
    );
    out.insert(
        "updatedAt".into(),
        render::optional_timestamp(fields.updated_at.as_ref()),
    );
    out.insert(
        "links".into(),
        render::links(links, &[("self", Some(Endpoint::Service(fields.service_id)))]),
    );
    render::merge_data_under(&mut out, fields.data);
    Value::Object(out)
}

/// Progress of a supplier's draft service through a framework application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftServiceStatus {
    NotSubmitted,
    Submitted,
    Failed,
}

impl DraftServiceStatus {
    pub const ALL: [DraftServiceStatus; 3] = [
        DraftServiceStatus::NotSubmitted,
        DraftServiceStatus::Submitted,
        DraftServiceStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DraftServiceStatus::NotSubmitted => "not-submitted",
            DraftServiceStatus::Submitted => "submitted",
            DraftServiceStatus::Failed => "failed",
        }
    }

    /// The supplier finished the draft, whatever the assessment outcome.
    pub fn is_completed(self) -> bool {
        matches!(self, DraftServiceStatus::Submitted | DraftServiceStatus::Failed)
    }
}

impl fmt::Display for DraftServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftServiceStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| {
                ValidationError::message(format!("Invalid draft service status value '{value}'"))
            })
    }
}

/// Stored fields of a draft service row.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftServiceRecord {
    pub id: DbId,
    pub service_id: Option<String>,
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub lot_id: DbId,
    pub data: Value,
    pub status: DraftServiceStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A service being prepared for a framework application.
///
/// `service_id` links a draft to the live service it was started from.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftService {
    id: Option<DbId>,
    service_id: Option<String>,
    supplier_id: SupplierId,
    framework_id: DbId,
    lot_id: DbId,
    data: Value,
    status: DraftServiceStatus,
    created_at: Option<Timestamp>,
    updated_at: Option<Timestamp>,
}

impl DraftService {
    /// Start an unsubmitted draft from an existing service.
    pub fn from_service(service: &Service) -> Self {
        Self {
            id: None,
            service_id: Some(service.service_id.clone()),
            supplier_id: service.supplier_id,
            framework_id: service.framework_id,
            lot_id: service.lot_id,
            data: service.data.clone(),
            status: DraftServiceStatus::NotSubmitted,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn from_record(record: DraftServiceRecord) -> Self {
        Self {
            id: Some(record.id),
            service_id: record.service_id,
            supplier_id: record.supplier_id,
            framework_id: record.framework_id,
            lot_id: record.lot_id,
            data: record.data,
            status: record.status,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }

    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    pub fn service_id(&self) -> Option<&str> {
        self.service_id.as_deref()
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn framework_id(&self) -> DbId {
        self.framework_id
    }

    pub fn lot_id(&self) -> DbId {
        self.lot_id
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn status(&self) -> DraftServiceStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    pub fn set_status(&mut self, status: &str) -> Result<(), ValidationError> {
        self.status = status.parse()?;
        Ok(())
    }
}
