//! Frameworks and lots: immutable reference data loaded once at start.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ValidationError;
use crate::types::DbId;

/// Administrative status of a framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkStatus {
    Coming,
    Open,
    Pending,
    Standstill,
    Live,
    Expired,
}

impl FrameworkStatus {
    pub const ALL: [FrameworkStatus; 6] = [
        FrameworkStatus::Coming,
        FrameworkStatus::Open,
        FrameworkStatus::Pending,
        FrameworkStatus::Standstill,
        FrameworkStatus::Live,
        FrameworkStatus::Expired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FrameworkStatus::Coming => "coming",
            FrameworkStatus::Open => "open",
            FrameworkStatus::Pending => "pending",
            FrameworkStatus::Standstill => "standstill",
            FrameworkStatus::Live => "live",
            FrameworkStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for FrameworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameworkStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::message(format!("Invalid framework status '{value}'")))
    }
}

/// A procurement category within one or more frameworks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub allows_brief: bool,
    pub one_service_limit: bool,
    pub unit_singular: String,
    pub unit_plural: String,
}

impl Lot {
    pub fn serialize(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "slug": self.slug,
            "allowsBrief": self.allows_brief,
            "oneServiceLimit": self.one_service_limit,
            "unitSingular": self.unit_singular,
            "unitPlural": self.unit_plural,
        })
    }
}

/// A procurement agreement grouping lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    /// Framework series, shared by successive iterations (e.g. `g-cloud`).
    pub family: String,
    pub status: FrameworkStatus,
    /// Lots in display order.
    pub lots: Vec<Lot>,
}

impl Framework {
    pub fn is_live(&self) -> bool {
        self.status == FrameworkStatus::Live
    }

    pub fn get_lot(&self, slug: &str) -> Option<&Lot> {
        self.lots.iter().find(|lot| lot.slug == slug)
    }

    pub fn get_lot_by_id(&self, lot_id: DbId) -> Option<&Lot> {
        self.lots.iter().find(|lot| lot.id == lot_id)
    }

    pub fn has_lot(&self, lot_id: DbId) -> bool {
        self.get_lot_by_id(lot_id).is_some()
    }
}

/// Lookup of every framework and its lots.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    frameworks: Vec<Arc<Framework>>,
    by_slug: HashMap<String, usize>,
    by_id: HashMap<DbId, usize>,
    lots: HashMap<(String, String), Lot>,
}

impl Catalog {
    pub fn new(frameworks: Vec<Framework>) -> Self {
        let mut catalog = Catalog::default();
        for framework in frameworks {
            let index = catalog.frameworks.len();
            catalog.by_slug.insert(framework.slug.clone(), index);
            catalog.by_id.insert(framework.id, index);
            for lot in &framework.lots {
                catalog
                    .lots
                    .insert((framework.slug.clone(), lot.slug.clone()), lot.clone());
            }
            catalog.frameworks.push(Arc::new(framework));
        }
        catalog
    }

    pub fn frameworks(&self) -> &[Arc<Framework>] {
        &self.frameworks
    }

    pub fn framework(&self, slug: &str) -> Option<&Arc<Framework>> {
        self.by_slug.get(slug).map(|&i| &self.frameworks[i])
    }

    pub fn framework_by_id(&self, id: DbId) -> Option<&Arc<Framework>> {
        self.by_id.get(&id).map(|&i| &self.frameworks[i])
    }

    pub fn lot(&self, framework_slug: &str, lot_slug: &str) -> Option<&Lot> {
        self.lots
            .get(&(framework_slug.to_string(), lot_slug.to_string()))
    }

    /// The live framework of a framework series, if any.
    pub fn live_framework(&self, family: &str) -> Option<&Arc<Framework>> {
        self.frameworks
            .iter()
            .find(|framework| framework.family == family && framework.is_live())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn lot(id: DbId, slug: &str, allows_brief: bool) -> Lot {
        Lot {
            id,
            slug: slug.to_string(),
            name: slug.replace('-', " "),
            allows_brief,
            one_service_limit: false,
            unit_singular: "service".to_string(),
            unit_plural: "services".to_string(),
        }
    }

    pub fn dos_framework(id: DbId, slug: &str, status: FrameworkStatus) -> Framework {
        Framework {
            id,
            slug: slug.to_string(),
            name: "Digital Outcomes and Specialists".to_string(),
            family: "digital-outcomes-and-specialists".to_string(),
            status,
            lots: vec![
                lot(5, "digital-outcomes", true),
                lot(6, "digital-specialists", true),
                lot(7, "user-research-studios", false),
                lot(8, "user-research-participants", true),
            ],
        }
    }

    pub fn g_cloud_framework() -> Framework {
        Framework {
            id: 1,
            slug: "g-cloud-7".to_string(),
            name: "G-Cloud 7".to_string(),
            family: "g-cloud".to_string(),
            status: FrameworkStatus::Live,
            lots: vec![lot(1, "saas", false), lot(2, "paas", false)],
        }
    }
}
