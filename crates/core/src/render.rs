//! Helpers shared by the `serialize` methods of every entity.

use serde_json::{Map, Value};

use crate::types::{DbId, SupplierId, Timestamp};

/// Wire format for timestamps: `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn timestamp(value: &Timestamp) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn optional_timestamp(value: Option<&Timestamp>) -> Value {
    value.map_or(Value::Null, |ts| Value::String(timestamp(ts)))
}

/// A resource a hyperlink can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Brief(DbId),
    BriefResponse(DbId),
    Framework(&'a str),
    Supplier(SupplierId),
    ContactInformation {
        supplier_id: SupplierId,
        contact_id: DbId,
    },
    Service(&'a str),
}

/// Turns an [`Endpoint`] into an absolute URL.
///
/// Implemented outside the core; the output is used opaquely.
pub trait LinkBuilder {
    fn url_for(&self, endpoint: Endpoint<'_>) -> String;
}

/// Builds URLs by appending a resource path to a fixed base URL.
#[derive(Debug, Clone)]
pub struct BaseUrlLinks {
    base_url: String,
}

impl BaseUrlLinks {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }
}

impl LinkBuilder for BaseUrlLinks {
    fn url_for(&self, endpoint: Endpoint<'_>) -> String {
        let path = match endpoint {
            Endpoint::Brief(id) => format!("/briefs/{id}"),
            Endpoint::BriefResponse(id) => format!("/brief-responses/{id}"),
            Endpoint::Framework(slug) => format!("/frameworks/{slug}"),
            Endpoint::Supplier(id) => format!("/suppliers/{id}"),
            Endpoint::ContactInformation {
                supplier_id,
                contact_id,
            } => format!("/suppliers/{supplier_id}/contact-information/{contact_id}"),
            Endpoint::Service(id) => format!("/services/{id}"),
        };
        format!("{}{path}", self.base_url)
    }
}

/// Build a `links` mapping, skipping relations whose target is not yet known
/// (e.g. the `self` link of an unsaved entity).
pub fn links(builder: &dyn LinkBuilder, relations: &[(&str, Option<Endpoint<'_>>)]) -> Value {
    let map: Map<String, Value> = relations
        .iter()
        .filter_map(|(rel, endpoint)| {
            endpoint.map(|ep| ((*rel).to_string(), Value::String(builder.url_for(ep))))
        })
        .collect();
    Value::Object(map)
}

/// Copy every key of `data` into `out` without overwriting existing keys.
pub(crate) fn merge_data_under(out: &mut Map<String, Value>, data: &Value) {
    if let Value::Object(fields) = data {
        for (key, value) in fields {
            out.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}
