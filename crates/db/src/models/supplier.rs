//! Supplier and contact information rows.

use chrono::NaiveDate;
use marketplace_core::supplier::{ContactInformation, Supplier};
use marketplace_core::types::{DbId, SupplierId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `suppliers` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierRow {
    pub id: DbId,
    pub supplier_id: SupplierId,
    pub name: String,
    pub description: String,
    pub clients: Json<Vec<String>>,
    pub duns_number: Option<String>,
    pub esourcing_id: Option<String>,
    pub companies_house_number: Option<String>,
    pub registered_name: Option<String>,
    pub registration_country: Option<String>,
    pub other_company_registration_number: Option<String>,
    pub registration_date: Option<NaiveDate>,
    pub vat_number: Option<String>,
    pub organisation_size: Option<String>,
    pub trading_status: Option<String>,
    pub company_details_confirmed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SupplierRow {
    pub fn into_supplier(self, contact_information: Vec<ContactInformation>) -> Supplier {
        Supplier {
            id: Some(self.id),
            supplier_id: self.supplier_id,
            name: self.name,
            description: self.description,
            clients: self.clients.0,
            duns_number: self.duns_number,
            esourcing_id: self.esourcing_id,
            companies_house_number: self.companies_house_number,
            registered_name: self.registered_name,
            registration_country: self.registration_country,
            other_company_registration_number: self.other_company_registration_number,
            registration_date: self.registration_date,
            vat_number: self.vat_number,
            organisation_size: self.organisation_size,
            trading_status: self.trading_status,
            company_details_confirmed: self.company_details_confirmed,
            contact_information,
        }
    }
}

/// A row from the `contact_information` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ContactInformationRow {
    pub id: DbId,
    pub supplier_id: SupplierId,
    pub contact_name: String,
    pub email: String,
    pub postcode: String,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
}

impl From<ContactInformationRow> for ContactInformation {
    fn from(row: ContactInformationRow) -> Self {
        ContactInformation {
            id: Some(row.id),
            supplier_id: row.supplier_id,
            contact_name: row.contact_name,
            email: row.email,
            postcode: row.postcode,
            phone_number: row.phone_number,
            website: row.website,
            address1: row.address1,
            city: row.city,
        }
    }
}
