//! Supplier framework and framework agreement rows.

use marketplace_core::agreement::{FrameworkAgreementRecord, SupplierFrameworkRecord};
use marketplace_core::types::{DbId, SupplierId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `supplier_frameworks` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierFrameworkRow {
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub declaration: Option<serde_json::Value>,
    pub on_framework: Option<bool>,
    pub prefill_declaration_from_framework_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SupplierFrameworkRow> for SupplierFrameworkRecord {
    fn from(row: SupplierFrameworkRow) -> Self {
        SupplierFrameworkRecord {
            supplier_id: row.supplier_id,
            framework_id: row.framework_id,
            declaration: row.declaration,
            on_framework: row.on_framework,
            prefill_declaration_from_framework_id: row.prefill_declaration_from_framework_id,
        }
    }
}

/// A row from the `framework_agreements` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FrameworkAgreementRow {
    pub id: DbId,
    pub supplier_id: SupplierId,
    pub framework_id: DbId,
    pub signed_agreement_details: Option<serde_json::Value>,
    pub signed_agreement_path: Option<String>,
    pub signed_agreement_returned_at: Option<Timestamp>,
    pub signed_agreement_put_on_hold_at: Option<Timestamp>,
    pub countersigned_agreement_details: Option<serde_json::Value>,
    pub countersigned_agreement_path: Option<String>,
    pub countersigned_agreement_returned_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<FrameworkAgreementRow> for FrameworkAgreementRecord {
    fn from(row: FrameworkAgreementRow) -> Self {
        FrameworkAgreementRecord {
            id: row.id,
            supplier_id: row.supplier_id,
            framework_id: row.framework_id,
            signed_agreement_details: row.signed_agreement_details,
            signed_agreement_path: row.signed_agreement_path,
            signed_agreement_returned_at: row.signed_agreement_returned_at,
            signed_agreement_put_on_hold_at: row.signed_agreement_put_on_hold_at,
            countersigned_agreement_details: row.countersigned_agreement_details,
            countersigned_agreement_path: row.countersigned_agreement_path,
            countersigned_agreement_returned_at: row.countersigned_agreement_returned_at,
        }
    }
}
