//! Care facility catalog.
//!
//! A flat list of hospitals, clinics and pharmacies shown on the map. The catalog is seeded
//! with a handful of Indore facilities the first time it is read while empty.

use crate::error::PatientResult;
use crate::storage::JsonCollection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Facility {
    pub id: String,
    pub name: String,
    /// hospital | clinic | pharmacy | ...
    #[serde(rename = "type")]
    pub kind: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub beds: u32,
}

fn facility(
    id: &str,
    name: &str,
    kind: &str,
    (lat, lon): (f64, f64),
    zone: &str,
    contact: &str,
    beds: u32,
) -> Facility {
    Facility {
        id: id.into(),
        name: name.into(),
        kind: kind.into(),
        lat,
        lon,
        zone: zone.into(),
        contact: contact.into(),
        beds,
    }
}

/// Facilities written to an empty catalog on first read.
pub fn default_facilities() -> Vec<Facility> {
    vec![
        facility(
            "IND_HSP_001",
            "Indore General",
            "hospital",
            (22.757113, 75.957443),
            "South",
            "+91-731-2000001",
            100,
        ),
        facility(
            "IND_HSP_002",
            "Vijay Nagar Care",
            "hospital",
            (22.674035, 75.899024),
            "East",
            "+91-731-2000002",
            120,
        ),
        facility(
            "IND_CLN_003",
            "Rajwada Clinic",
            "clinic",
            (22.782558, 75.839607),
            "Central",
            "+91-731-2000003",
            15,
        ),
        facility(
            "IND_HSP_004",
            "MR-10 Trauma Center",
            "hospital",
            (22.674416, 75.976310),
            "North",
            "+91-731-2000004",
            80,
        ),
    ]
}

#[derive(Debug)]
pub struct FacilityCatalog {
    facilities: JsonCollection<Facility>,
}

impl FacilityCatalog {
    pub fn load(path: PathBuf) -> PatientResult<Self> {
        Ok(Self {
            facilities: JsonCollection::load(path)?,
        })
    }

    /// Lists all facilities, seeding and persisting the defaults if the catalog is empty.
    pub fn list(&self) -> PatientResult<Vec<Facility>> {
        if self.facilities.is_empty()? && self.facilities.seed_if_empty(default_facilities)? {
            tracing::info!("facility catalog was empty, seeded defaults");
        }
        self.facilities.all()
    }

    pub fn len(&self) -> PatientResult<usize> {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> PatientResult<bool> {
        self.facilities.is_empty()
    }
}
