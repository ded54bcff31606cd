//! Supplier profiles and their contact records.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::render::{self, Endpoint, LinkBuilder};
use crate::types::{DbId, SupplierId};
use crate::validation::{parse_date_strict, DATE_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInformation {
    pub id: Option<DbId>,
    pub supplier_id: SupplierId,
    pub contact_name: String,
    pub email: String,
    pub postcode: String,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
}

impl ContactInformation {
    pub fn serialize(&self, links: &dyn LinkBuilder) -> Value {
        let mut out = Map::new();
        out.insert("id".into(), self.id.into());
        out.insert("contactName".into(), self.contact_name.clone().into());
        out.insert("email".into(), self.email.clone().into());
        out.insert("postcode".into(), self.postcode.clone().into());
        for (key, value) in [
            ("phoneNumber", &self.phone_number),
            ("website", &self.website),
            ("address1", &self.address1),
            ("city", &self.city),
        ] {
            if let Some(value) = value {
                out.insert(key.into(), value.clone().into());
            }
        }
        out.insert(
            "links".into(),
            render::links(
                links,
                &[(
                    "self",
                    self.id.map(|contact_id| Endpoint::ContactInformation {
                        supplier_id: self.supplier_id,
                        contact_id,
                    }),
                )],
            ),
        );
        Value::Object(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supplier {
    /// Row id, never exposed.
    pub id: Option<DbId>,
    pub supplier_id: SupplierId,
    pub name: String,
    pub description: String,
    pub clients: Vec<String>,
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
    pub contact_information: Vec<ContactInformation>,
}

/// Fields a supplier may change about itself.
///
/// Identity keys (`id`, `supplierId`) are not listed and so are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupplierUpdate {
    name: Option<String>,
    description: Option<String>,
    clients: Option<Vec<String>>,
    duns_number: Option<String>,
    #[serde(rename = "eSourcingId")]
    esourcing_id: Option<String>,
    companies_house_number: Option<String>,
    registered_name: Option<String>,
    registration_country: Option<String>,
    other_company_registration_number: Option<String>,
    registration_date: Option<String>,
    vat_number: Option<String>,
    organisation_size: Option<String>,
    trading_status: Option<String>,
    company_details_confirmed: Option<bool>,
}

impl Supplier {
    pub fn new(supplier_id: SupplierId, name: impl Into<String>) -> Self {
        Self {
            id: None,
            supplier_id,
            name: name.into(),
            description: String::new(),
            clients: Vec::new(),
            duns_number: None,
            esourcing_id: None,
            companies_house_number: None,
            registered_name: None,
            registration_country: None,
            other_company_registration_number: None,
            registration_date: None,
            vat_number: None,
            organisation_size: None,
            trading_status: None,
            company_details_confirmed: false,
            contact_information: Vec::new(),
        }
    }

    /// Apply a camelCase payload. Nothing changes if any field is invalid.
    pub fn update_from_json(&mut self, data: &Value) -> Result<(), ValidationError> {
        let update = SupplierUpdate::deserialize(data)
            .map_err(|e| ValidationError::message(format!("Invalid supplier data: {e}")))?;
        let registration_date = update
            .registration_date
            .as_deref()
            .map(|value| parse_date_strict(value, DATE_FORMAT, "Registration date"))
            .transpose()?;

        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(clients) = update.clients {
            self.clients = clients;
        }
        if let Some(confirmed) = update.company_details_confirmed {
            self.company_details_confirmed = confirmed;
        }
        if registration_date.is_some() {
            self.registration_date = registration_date;
        }
        for (target, value) in [
            (&mut self.duns_number, update.duns_number),
            (&mut self.esourcing_id, update.esourcing_id),
            (&mut self.companies_house_number, update.companies_house_number),
            (&mut self.registered_name, update.registered_name),
            (&mut self.registration_country, update.registration_country),
            (
                &mut self.other_company_registration_number,
                update.other_company_registration_number,
            ),
            (&mut self.vat_number, update.vat_number),
            (&mut self.organisation_size, update.organisation_size),
            (&mut self.trading_status, update.trading_status),
        ] {
            if value.is_some() {
                *target = value;
            }
        }
        Ok(())
    }

    /// Unset optional fields are omitted.
    pub fn serialize(&self, links: &dyn LinkBuilder) -> Value {
        let mut out = Map::new();
        out.insert("id".into(), self.supplier_id.into());
        out.insert("name".into(), self.name.clone().into());
        out.insert("description".into(), self.description.clone().into());
        out.insert("clients".into(), self.clients.clone().into());
        for (key, value) in [
            ("dunsNumber", &self.duns_number),
            ("eSourcingId", &self.esourcing_id),
            ("companiesHouseNumber", &self.companies_house_number),
            ("registeredName", &self.registered_name),
            ("registrationCountry", &self.registration_country),
            ("otherCompanyRegistrationNumber", &self.other_company_registration_number),
            ("vatNumber", &self.vat_number),
            ("organisationSize", &self.organisation_size),
            ("tradingStatus", &self.trading_status),
        ] {
            if let Some(value) = value {
                out.insert(key.into(), value.clone().into());
            }
        }
        if let Some(date) = self.registration_date {
            out.insert(
                "registrationDate".into(),
                date.format(render::DATE_FORMAT).to_string().into(),
            );
        }
        if self.company_details_confirmed {
            out.insert("companyDetailsConfirmed".into(), true.into());
        }
        out.insert(
            "contactInformation".into(),
            Value::Array(
                self.contact_information
                    .iter()
                    .map(|contact| contact.serialize(links))
                    .collect(),
            ),
        );
        out.insert(
            "links".into(),
            render::links(links, &[("self", Some(Endpoint::Supplier(self.supplier_id)))]),
        );
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::render::BaseUrlLinks;

    fn supplier() -> Supplier {
        let mut supplier = Supplier::new(0, "Supplier 0");
        supplier.id = Some(1);
        supplier.contact_information.push(ContactInformation {
            id: Some(4),
            supplier_id: 0,
            contact_name: "Contact for Supplier 0".to_string(),
            email: "0@contact.com".to_string(),
            postcode: "SW1A 1AA".to_string(),
            phone_number: None,
            website: None,
            address1: None,
            city: None,
        });
        supplier
    }

    fn links() -> BaseUrlLinks {
        BaseUrlLinks::new("http://api.test")
    }

    #[test]
    fn serialization_of_new_supplier() {
        assert_eq!(
            supplier().serialize(&links()),
            json!({
                "id": 0,
                "name": "Supplier 0",
                "description": "",
                "clients": [],
                "contactInformation": [{
                    "id": 4,
                    "contactName": "Contact for Supplier 0",
                    "email": "0@contact.com",
                    "postcode": "SW1A 1AA",
                    "links": {
                        "self": "http://api.test/suppliers/0/contact-information/4"
                    },
                }],
                "links": {"self": "http://api.test/suppliers/0"},
            })
        );
    }

    #[test]
    fn update_from_json_ignores_identity_fields() {
        let mut supplier = supplier();
        supplier
            .update_from_json(&json!({
                "id": 90006000,
                "supplierId": "DO_NOT_UPDATE_ME",
                "name": "String and Sticky Tape Inc.",
                "clients": ["Parcel Wrappers Ltd"],
                "dunsNumber": "01010101",
                "eSourcingId": "020202",
                "description": "All your parcel wrapping needs catered for",
                "companiesHouseNumber": "98765432",
                "registeredName": "Tape and String Inc.",
                "registrationCountry": "Wales",
                "otherCompanyRegistrationNumber": "",
                "registrationDate": "1973-08-10",
                "vatNumber": "321321321",
                "organisationSize": "medium",
                "tradingStatus": "Sticky",
            }))
            .unwrap();

        assert_eq!(supplier.id, Some(1));
        assert_eq!(supplier.supplier_id, 0);
        assert_eq!(supplier.name, "String and Sticky Tape Inc.");
        assert_eq!(supplier.esourcing_id.as_deref(), Some("020202"));
        assert_eq!(supplier.other_company_registration_number.as_deref(), Some(""));
        assert_eq!(
            supplier.registration_date,
            NaiveDate::from_ymd_opt(1973, 8, 10)
        );

        let rendered = supplier.serialize(&links());
        assert_eq!(rendered["registrationDate"], "1973-08-10");
        assert_eq!(rendered["otherCompanyRegistrationNumber"], "");
        assert_eq!(rendered["tradingStatus"], "Sticky");
        assert!(rendered.get("companyDetailsConfirmed").is_none());
    }

    #[test]
    fn badly_formatted_date_is_rejected_without_changes() {
        let mut supplier = supplier();
        let err = supplier
            .update_from_json(&json!({"name": "New", "registrationDate": "July 4, 1776"}))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Registration date format must be %Y-%m-%d"));
        assert_eq!(supplier.name, "Supplier 0");
    }

    #[test]
    fn company_details_confirmed_is_shown_once_set() {
        let mut supplier = supplier();
        supplier
            .update_from_json(&json!({"companyDetailsConfirmed": true}))
            .unwrap();
        assert_eq!(supplier.serialize(&links())["companyDetailsConfirmed"], true);
    }
}
