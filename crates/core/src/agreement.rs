//! Supplier participation in a framework and the agreement signing lifecycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ValidationError;
use crate::render;
use crate::scrub::scrub_payload;
use crate::types::{DbId, SupplierId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgreementStatus {
    Draft,
    Signed,
    OnHold,
    Approved,
    Countersigned,
}

impl AgreementStatus {
    pub const ALL: [AgreementStatus; 5] = [
        AgreementStatus::Draft,
        AgreementStatus::Signed,
        AgreementStatus::OnHold,
        AgreementStatus::Approved,
        AgreementStatus::Countersigned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgreementStatus::Draft => "draft",
            AgreementStatus::Signed => "signed",
            AgreementStatus::OnHold => "on-hold",
            AgreementStatus::Approved => "approved",
            AgreementStatus::Countersigned => "countersigned",
        }
    }
}

impl fmt::Display for AgreementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgreementStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::message(format!("Invalid agreement status '{value}'")))
    }
}

/// Stored fields of a framework agreement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameworkAgreementRecord {
    pub id: DbId,
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub signed_agreement_details: Option<Value>,
    pub signed_agreement_path: Option<String>,
    pub signed_agreement_returned_at: Option<Timestamp>,
    pub signed_agreement_put_on_hold_at: Option<Timestamp>,
    pub countersigned_agreement_details: Option<Value>,
    pub countersigned_agreement_path: Option<String>,
    pub countersigned_agreement_returned_at: Option<Timestamp>,
}

/// The legal signing record between a supplier and a framework.
///
/// Storage refuses rows without a matching supplier framework.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameworkAgreement {
    id: Option<DbId>,
    supplier_id: SupplierId,
    framework_id: DbId,
    signed_agreement_details: Option<Value>,
    signed_agreement_path: Option<String>,
    signed_agreement_returned_at: Option<Timestamp>,
    signed_agreement_put_on_hold_at: Option<Timestamp>,
    countersigned_agreement_details: Option<Value>,
    countersigned_agreement_path: Option<String>,
    countersigned_agreement_returned_at: Option<Timestamp>,
}

impl FrameworkAgreement {
    pub fn new(supplier_id: SupplierId, framework_id: DbId) -> Self {
        Self {
            id: None,
            supplier_id,
            framework_id,
            signed_agreement_details: None,
            signed_agreement_path: None,
            signed_agreement_returned_at: None,
            signed_agreement_put_on_hold_at: None,
            countersigned_agreement_details: None,
            countersigned_agreement_path: None,
            countersigned_agreement_returned_at: None,
        }
    }

    pub fn from_record(record: FrameworkAgreementRecord) -> Self {
        Self {
            id: Some(record.id),
            supplier_id: record.supplier_id,
            framework_id: record.framework_id,
            signed_agreement_details: record.signed_agreement_details,
            signed_agreement_path: record.signed_agreement_path,
            signed_agreement_returned_at: record.signed_agreement_returned_at,
            signed_agreement_put_on_hold_at: record.signed_agreement_put_on_hold_at,
            countersigned_agreement_details: record.countersigned_agreement_details,
            countersigned_agreement_path: record.countersigned_agreement_path,
            countersigned_agreement_returned_at: record.countersigned_agreement_returned_at,
        }
    }

    pub fn mark_persisted(&mut self, id: DbId) {
        self.id = Some(id);
    }

    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn framework_id(&self) -> DbId {
        self.framework_id
    }

    pub fn signed_agreement_details(&self) -> Option<&Value> {
        self.signed_agreement_details.as_ref()
    }

    pub fn signed_agreement_path(&self) -> Option<&str> {
        self.signed_agreement_path.as_deref()
    }

    pub fn signed_agreement_returned_at(&self) -> Option<Timestamp> {
        self.signed_agreement_returned_at
    }

    pub fn signed_agreement_put_on_hold_at(&self) -> Option<Timestamp> {
        self.signed_agreement_put_on_hold_at
    }

    pub fn countersigned_agreement_details(&self) -> Option<&Value> {
        self.countersigned_agreement_details.as_ref()
    }

    pub fn countersigned_agreement_path(&self) -> Option<&str> {
        self.countersigned_agreement_path.as_deref()
    }

    pub fn countersigned_agreement_returned_at(&self) -> Option<Timestamp> {
        self.countersigned_agreement_returned_at
    }

    pub fn status(&self) -> AgreementStatus {
        derive_agreement_status(
            self.signed_agreement_returned_at,
            self.signed_agreement_put_on_hold_at,
            self.countersigned_agreement_returned_at,
            self.countersigned_agreement_path.as_deref(),
        )
    }

    /// Countersignature time if any, else signature time.
    pub fn most_recent_signature_time(&self) -> Option<Timestamp> {
        self.countersigned_agreement_returned_at
            .or(self.signed_agreement_returned_at)
    }

    fn require_status(
        &self,
        allowed: &[AgreementStatus],
        action: &str,
    ) -> Result<(), ValidationError> {
        let status = self.status();
        if allowed.contains(&status) {
            return Ok(());
        }
        Err(ValidationError::message(format!(
            "Cannot {action} a framework agreement with status '{status}'"
        )))
    }

    /// Merge details entered by the supplier ahead of signing.
    pub fn update_signed_agreement_details(&mut self, patch: Value) -> Result<(), ValidationError> {
        self.require_status(&[AgreementStatus::Draft], "update the details of")?;
        let mut details = match self.signed_agreement_details.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Value::Object(fields) = scrub_payload(patch) {
            details.extend(fields);
        }
        self.signed_agreement_details = Some(Value::Object(details));
        Ok(())
    }

    pub fn set_signed_agreement_path(&mut self, path: impl Into<String>) -> Result<(), ValidationError> {
        self.require_status(&[AgreementStatus::Draft], "upload a signed file to")?;
        self.signed_agreement_path = Some(path.into());
        Ok(())
    }

    /// Record the supplier's signature. The signed file must be uploaded first.
    pub fn sign(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.require_status(&[AgreementStatus::Draft], "sign")?;
        if self.signed_agreement_path.is_none() {
            return Err(ValidationError::message(
                "Framework agreement can not be signed without a signed agreement file",
            ));
        }
        self.signed_agreement_returned_at = Some(now);
        Ok(())
    }

    pub fn put_on_hold(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.require_status(&[AgreementStatus::Signed], "put on hold")?;
        self.signed_agreement_put_on_hold_at = Some(now);
        Ok(())
    }

    /// Approve for countersignature. Lifts any hold.
    pub fn approve(&mut self, details: Value, now: Timestamp) -> Result<(), ValidationError> {
        self.require_status(&[AgreementStatus::Signed, AgreementStatus::OnHold], "approve")?;
        self.signed_agreement_put_on_hold_at = None;
        self.countersigned_agreement_details = Some(scrub_payload(details));
        self.countersigned_agreement_returned_at = Some(now);
        Ok(())
    }

    pub fn set_countersigned_agreement_path(
        &mut self,
        path: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.require_status(
            &[AgreementStatus::Approved, AgreementStatus::Countersigned],
            "countersign",
        )?;
        self.countersigned_agreement_path = Some(path.into());
        Ok(())
    }

    pub fn serialize(&self, framework_slug: &str) -> Value {
        let mut out = Map::new();
        out.insert("id".into(), self.id.into());
        out.insert("supplierId".into(), self.supplier_id.into());
        out.insert("frameworkSlug".into(), framework_slug.into());
        out.insert("status".into(), self.status().as_str().into());

        if let Some(details) = &self.signed_agreement_details {
            out.insert("signedAgreementDetails".into(), details.clone());
        }
        if let Some(path) = &self.signed_agreement_path {
            out.insert("signedAgreementPath".into(), path.clone().into());
        }
        if let Some(details) = &self.countersigned_agreement_details {
            out.insert("countersignedAgreementDetails".into(), details.clone());
        }
        if let Some(path) = &self.countersigned_agreement_path {
            out.insert("countersignedAgreementPath".into(), path.clone().into());
        }
        for (key, value) in [
            ("signedAgreementReturnedAt", self.signed_agreement_returned_at),
            ("signedAgreementPutOnHoldAt", self.signed_agreement_put_on_hold_at),
            ("countersignedAgreementReturnedAt", self.countersigned_agreement_returned_at),
        ] {
            if let Some(ts) = value {
                out.insert(key.into(), render::timestamp(&ts).into());
            }
        }
        Value::Object(out)
    }
}

pub fn derive_agreement_status(
    signed_returned_at: Option<Timestamp>,
    put_on_hold_at: Option<Timestamp>,
    countersigned_returned_at: Option<Timestamp>,
    countersigned_path: Option<&str>,
) -> AgreementStatus {
    if signed_returned_at.is_none() {
        return AgreementStatus::Draft;
    }
    match (countersigned_returned_at, countersigned_path) {
        (Some(_), Some(_)) => AgreementStatus::Countersigned,
        (Some(_), None) => AgreementStatus::Approved,
        (None, _) if put_on_hold_at.is_some() => AgreementStatus::OnHold,
        (None, _) => AgreementStatus::Signed,
    }
}

/// The signed agreement with the latest signature time, ties going to the
/// highest id. Drafts never qualify.
pub fn current_framework_agreement(agreements: &[FrameworkAgreement]) -> Option<&FrameworkAgreement> {
    agreements
        .iter()
        .filter(|agreement| agreement.signed_agreement_returned_at.is_some())
        .max_by_key(|agreement| (agreement.most_recent_signature_time(), agreement.id))
}

/// Stored fields of a supplier framework row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierFrameworkRecord {
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub declaration: Option<Value>,
    pub on_framework: Option<bool>,
    pub prefill_declaration_from_framework_id: Option<DbId>,
}

/// A supplier's participation in one framework.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierFramework {
    supplier_id: SupplierId,
    framework_id: DbId,
    declaration: Option<Value>,
    on_framework: Option<bool>,
    prefill_declaration_from_framework_id: Option<DbId>,
}

/// Related names needed to serialize a [`SupplierFramework`].
#[derive(Debug, Clone, Copy)]
pub struct SupplierFrameworkContext<'a> {
    pub supplier_name: &'a str,
    pub framework_slug: &'a str,
    pub prefill_declaration_from_framework_slug: Option<&'a str>,
    pub agreements: &'a [FrameworkAgreement],
}

impl SupplierFramework {
    pub fn new(supplier_id: SupplierId, framework_id: DbId) -> Self {
        Self {
            supplier_id,
            framework_id,
            declaration: None,
            on_framework: None,
            prefill_declaration_from_framework_id: None,
        }
    }

    pub fn from_record(record: SupplierFrameworkRecord) -> Self {
        Self {
            supplier_id: record.supplier_id,
            framework_id: record.framework_id,
            declaration: record.declaration,
            on_framework: record.on_framework,
            prefill_declaration_from_framework_id: record.prefill_declaration_from_framework_id,
        }
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn framework_id(&self) -> DbId {
        self.framework_id
    }

    pub fn declaration(&self) -> Option<&Value> {
        self.declaration.as_ref()
    }

    pub fn on_framework(&self) -> Option<bool> {
        self.on_framework
    }

    pub fn prefill_declaration_from_framework_id(&self) -> Option<DbId> {
        self.prefill_declaration_from_framework_id
    }

    /// Organisation size answered in the declaration, if any.
    pub fn organisation_size(&self) -> Option<&str> {
        self.declaration
            .as_ref()
            .and_then(|d| d.get("organisationSize"))
            .and_then(Value::as_str)
    }

    /// Replace the declaration. Scrubbed before it is stored.
    pub fn set_declaration(&mut self, declaration: Value) {
        self.declaration = Some(scrub_payload(declaration));
    }

    pub fn update_declaration(&mut self, patch: Value) {
        let mut merged = match self.declaration.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Value::Object(fields) = patch {
            merged.extend(fields);
        }
        self.set_declaration(Value::Object(merged));
    }

    pub fn set_on_framework(&mut self, on_framework: Option<bool>) {
        self.on_framework = on_framework;
    }

    /// Point at another framework of the same supplier to prefill from.
    pub fn set_prefill_declaration_from_framework_id(
        &mut self,
        framework_id: Option<DbId>,
    ) -> Result<(), ValidationError> {
        if framework_id == Some(self.framework_id) {
            return Err(ValidationError::message(
                "Cannot prefill a declaration from the same framework",
            ));
        }
        self.prefill_declaration_from_framework_id = framework_id;
        Ok(())
    }

    /// The supplier framework the declaration is prefilled from, among `candidates`.
    pub fn prefill_declaration_from<'a>(
        &self,
        candidates: &'a [SupplierFramework],
    ) -> Option<&'a SupplierFramework> {
        let framework_id = self.prefill_declaration_from_framework_id?;
        candidates.iter().find(|candidate| {
            candidate.supplier_id == self.supplier_id && candidate.framework_id == framework_id
        })
    }

    pub fn serialize(&self, context: SupplierFrameworkContext<'_>) -> Value {
        let current = current_framework_agreement(context.agreements);
        let countersigned_at = current.and_then(|a| a.countersigned_agreement_returned_at);

        json!({
            "supplierId": self.supplier_id,
            "supplierName": context.supplier_name,
            "frameworkSlug": context.framework_slug,
            "declaration": self.declaration.clone().unwrap_or_else(|| json!({})),
            "onFramework": self.on_framework,
            "prefillDeclarationFromFrameworkSlug": context.prefill_declaration_from_framework_slug,
            "agreementId": current.and_then(FrameworkAgreement::id),
            "agreementReturned": current.is_some(),
            "agreementReturnedAt": render::optional_timestamp(
                current.and_then(|a| a.signed_agreement_returned_at).as_ref()
            ),
            "agreementDetails": current.and_then(|a| a.signed_agreement_details.clone()),
            "agreementPath": current.and_then(|a| a.signed_agreement_path.clone()),
            "agreementStatus": current.map(|a| a.status().as_str()),
            "countersigned": countersigned_at.is_some(),
            "countersignedAt": render::optional_timestamp(countersigned_at.as_ref()),
            "countersignedDetails": current.and_then(|a| a.countersigned_agreement_details.clone()),
            "countersignedPath": current.and_then(|a| a.countersigned_agreement_path.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn at(month: u32, day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2016, month, day, 11, 12, 0).unwrap()
    }

    fn agreement(
        id: DbId,
        signed: Option<Timestamp>,
        countersigned: Option<Timestamp>,
    ) -> FrameworkAgreement {
        FrameworkAgreement::from_record(FrameworkAgreementRecord {
            id,
            supplier_id: 0,
            framework_id: 1,
            signed_agreement_path: signed.map(|_| "path".to_string()),
            signed_agreement_returned_at: signed,
            countersigned_agreement_returned_at: countersigned,
            ..Default::default()
        })
    }

    #[test]
    fn new_agreement_is_draft() {
        assert_eq!(FrameworkAgreement::new(0, 1).status(), AgreementStatus::Draft);
    }

    #[test]
    fn details_and_path_without_return_is_still_draft() {
        let mut agreement = FrameworkAgreement::new(0, 1);
        agreement
            .update_signed_agreement_details(json!({"agreement": "details"}))
            .unwrap();
        agreement.set_signed_agreement_path("path").unwrap();
        assert_eq!(agreement.status(), AgreementStatus::Draft);
    }

    #[test]
    fn status_derivation() {
        let now = Some(Utc::now());
        assert_eq!(derive_agreement_status(now, None, None, None), AgreementStatus::Signed);
        assert_eq!(derive_agreement_status(now, now, None, None), AgreementStatus::OnHold);
        assert_eq!(derive_agreement_status(now, None, now, None), AgreementStatus::Approved);
        assert_eq!(
            derive_agreement_status(now, None, now, Some("/countersigned.pdf")),
            AgreementStatus::Countersigned
        );
        assert_eq!(derive_agreement_status(None, now, now, Some("x")), AgreementStatus::Draft);
    }

    #[test]
    fn most_recent_signature_time() {
        let mut agreement = FrameworkAgreement::new(0, 1);
        assert_eq!(agreement.most_recent_signature_time(), None);

        agreement.set_signed_agreement_path("/path/to/the/agreement.pdf").unwrap();
        agreement.sign(at(9, 10)).unwrap();
        assert_eq!(agreement.most_recent_signature_time(), Some(at(9, 10)));

        agreement.approve(json!({}), at(10, 11)).unwrap();
        agreement
            .set_countersigned_agreement_path("/path/to/the/countersignedAgreement.pdf")
            .unwrap();
        assert_eq!(agreement.most_recent_signature_time(), Some(at(10, 11)));
        assert_eq!(agreement.status(), AgreementStatus::Countersigned);
    }

    #[test]
    fn signing_workflow_guards() {
        let mut agreement = FrameworkAgreement::new(0, 1);
        let err = agreement.sign(at(1, 1)).unwrap_err();
        assert!(err.to_string().contains("without a signed agreement file"));
        assert!(agreement.put_on_hold(at(1, 1)).is_err());
        assert!(agreement.approve(json!({}), at(1, 1)).is_err());

        agreement.set_signed_agreement_path("path").unwrap();
        agreement.sign(at(1, 2)).unwrap();
        assert!(agreement.update_signed_agreement_details(json!({"a": 1})).is_err());
        assert!(agreement.set_countersigned_agreement_path("x").is_err());

        agreement.put_on_hold(at(1, 3)).unwrap();
        assert_eq!(agreement.status(), AgreementStatus::OnHold);
        let err = agreement.put_on_hold(at(1, 4)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot put on hold a framework agreement with status 'on-hold'"
        );

        agreement.approve(json!({"approvedBy": " admin "}), at(1, 5)).unwrap();
        assert_eq!(agreement.status(), AgreementStatus::Approved);
        assert_eq!(agreement.signed_agreement_put_on_hold_at(), None);
        assert_eq!(
            agreement.countersigned_agreement_details(),
            Some(&json!({"approvedBy": "admin"}))
        );
    }

    #[test]
    fn current_agreement_ignores_drafts() {
        assert!(current_framework_agreement(&[]).is_none());
        let drafts = [agreement(1, None, None), agreement(2, None, None)];
        assert!(current_framework_agreement(&drafts).is_none());
    }

    #[test]
    fn current_agreement_is_latest_signed() {
        let agreements = [
            agreement(1, Some(at(9, 10)), None),
            agreement(2, Some(at(9, 11)), None),
            agreement(3, None, None),
        ];
        assert_eq!(current_framework_agreement(&agreements).and_then(|a| a.id()), Some(2));
    }

    #[test]
    fn countersignature_can_overtake_later_signature() {
        let agreements = [
            agreement(1, Some(at(9, 10)), Some(at(10, 11))),
            agreement(2, Some(at(9, 20)), None),
        ];
        assert_eq!(current_framework_agreement(&agreements).and_then(|a| a.id()), Some(1));

        let agreements = [
            agreement(1, Some(at(9, 10)), Some(at(9, 12))),
            agreement(2, Some(at(9, 20)), None),
        ];
        assert_eq!(current_framework_agreement(&agreements).and_then(|a| a.id()), Some(2));
    }

    #[test]
    fn ties_go_to_highest_id() {
        let agreements = [
            agreement(4, Some(at(9, 10)), None),
            agreement(7, Some(at(9, 10)), None),
            agreement(5, Some(at(9, 10)), None),
        ];
        assert_eq!(current_framework_agreement(&agreements).and_then(|a| a.id()), Some(7));
    }

    #[test]
    fn declaration_is_scrubbed() {
        let mut sf = SupplierFramework::new(0, 1);
        sf.set_declaration(json!({"foo": "bar", "bar": null}));
        assert_eq!(sf.declaration(), Some(&json!({"foo": "bar"})));

        sf.set_declaration(json!({"foo": " bar ", "bar": "", "other": " "}));
        assert_eq!(sf.declaration(), Some(&json!({"foo": "bar", "bar": "", "other": ""})));

        sf.update_declaration(json!({"organisationSize": " micro "}));
        assert_eq!(sf.organisation_size(), Some("micro"));
    }

    #[test]
    fn prefill_must_point_at_another_framework() {
        let source = SupplierFramework::new(0, 1);
        let mut target = SupplierFramework::new(0, 2);
        assert!(target.set_prefill_declaration_from_framework_id(Some(2)).is_err());
        target.set_prefill_declaration_from_framework_id(Some(1)).unwrap();

        let candidates = [SupplierFramework::new(1, 1), source.clone()];
        assert_eq!(target.prefill_declaration_from(&candidates), Some(&source));
        assert_eq!(source.prefill_declaration_from(&candidates), None);
    }

    #[test]
    fn serialize_reports_current_agreement() {
        let agreements = [
            agreement(1, Some(Utc::now() - Duration::days(2)), None),
            agreement(2, None, None),
        ];
        let sf = SupplierFramework::new(0, 1);
        let rendered = sf.serialize(SupplierFrameworkContext {
            supplier_name: "Supplier 0",
            framework_slug: "g-cloud-7",
            prefill_declaration_from_framework_slug: Some("g-cloud-6"),
            agreements: &agreements,
        });

        assert_eq!(rendered["agreementId"], 1);
        assert_eq!(rendered["agreementReturned"], true);
        assert_eq!(rendered["agreementStatus"], "signed");
        assert_eq!(rendered["agreementPath"], "path");
        assert_eq!(rendered["countersigned"], false);
        assert_eq!(rendered["countersignedAt"], Value::Null);
        assert_eq!(rendered["prefillDeclarationFromFrameworkSlug"], "g-cloud-6");
        assert_eq!(rendered["declaration"], json!({}));
    }

    #[test]
    fn serialize_without_agreements() {
        let sf = SupplierFramework::new(0, 1);
        let rendered = sf.serialize(SupplierFrameworkContext {
            supplier_name: "Supplier 0",
            framework_slug: "g-cloud-7",
            prefill_declaration_from_framework_slug: None,
            agreements: &[],
        });
        assert_eq!(rendered["agreementId"], Value::Null);
        assert_eq!(rendered["agreementReturned"], false);
        assert_eq!(rendered["prefillDeclarationFromFrameworkSlug"], Value::Null);
    }
}
