//! Patient record types.
//!
//! A [`PatientRecord`] is a flat, self-reported health dashboard keyed by a caller-chosen
//! `user_id`. Every field other than the identifier, PIN, sharing settings and timestamps is
//! optional and is written to disk as `null` when unset.
//!
//! [`PatientPatch`] describes a partial update: any field left as `None` (absent or explicit
//! `null` on the wire) leaves the stored value untouched.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Who a patient has agreed to share their dashboard with.
///
/// Stored as metadata only; nothing in the service restricts reads based on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Consent {
    #[default]
    None,
    All,
    Doctors,
    Custom,
}

/// A single patient's record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRecord {
    pub user_id: String,
    pub pin: String,

    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact: Option<String>,

    pub conditions: Option<String>,
    pub allergies: Option<String>,
    pub meds: Option<String>,

    #[serde(default)]
    pub consent: Consent,
    /// Identifiers the record is shared with when `consent` is `custom`.
    #[serde(default)]
    pub share_with: Vec<String>,

    pub assigned_doctor_id: Option<String>,
    pub facility_id: Option<String>,

    /// Epoch milliseconds of first registration.
    pub created_at: i64,
    /// Epoch milliseconds of the last successful mutation.
    pub updated_at: i64,
}

impl PatientRecord {
    /// A freshly registered record with every optional field unset.
    pub(crate) fn new(
        user_id: String,
        pin: String,
        assigned_doctor_id: Option<String>,
        facility_id: Option<String>,
        now: i64,
    ) -> Self {
        Self {
            user_id,
            pin,
            name: None,
            age: None,
            gender: None,
            height_cm: None,
            weight_kg: None,
            bmi: None,
            phone: None,
            email: None,
            emergency_contact: None,
            conditions: None,
            allergies: None,
            meds: None,
            consent: Consent::None,
            share_with: Vec::new(),
            assigned_doctor_id,
            facility_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compares every stored field except the timestamps.
    pub(crate) fn same_content(&self, other: &Self) -> bool {
        let mut a = self.clone();
        a.created_at = other.created_at;
        a.updated_at = other.updated_at;
        a == *other
    }
}

/// Fields a patient may change through an update. The identifier and PIN are not on the list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact: Option<String>,
    pub conditions: Option<String>,
    pub allergies: Option<String>,
    pub meds: Option<String>,
    pub consent: Option<Consent>,
    pub share_with: Option<Vec<String>>,
    pub assigned_doctor_id: Option<String>,
    pub facility_id: Option<String>,
}

impl PatientPatch {
    /// Writes every supplied field onto `record`.
    ///
    /// When the patch changes height or weight without an explicit `bmi`, and the result has
    /// both, `bmi` is derived from them.
    pub(crate) fn apply_to(self, record: &mut PatientRecord) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if let Some(v) = value {
                *slot = Some(v);
            }
        }

        let derive = self.bmi.is_none() && (self.height_cm.is_some() || self.weight_kg.is_some());

        set(&mut record.name, self.name);
        set(&mut record.age, self.age);
        set(&mut record.gender, self.gender);
        set(&mut record.height_cm, self.height_cm);
        set(&mut record.weight_kg, self.weight_kg);
        set(&mut record.bmi, self.bmi);
        set(&mut record.phone, self.phone);
        set(&mut record.email, self.email);
        set(&mut record.emergency_contact, self.emergency_contact);
        set(&mut record.conditions, self.conditions);
        set(&mut record.allergies, self.allergies);
        set(&mut record.meds, self.meds);
        set(&mut record.assigned_doctor_id, self.assigned_doctor_id);
        set(&mut record.facility_id, self.facility_id);
        if let Some(consent) = self.consent {
            record.consent = consent;
        }
        if let Some(share_with) = self.share_with {
            record.share_with = share_with;
        }

        if derive {
            if let (Some(h), Some(w)) = (record.height_cm, record.weight_kg) {
                if let Some(bmi) = derive_bmi(h, w) {
                    record.bmi = Some(bmi);
                }
            }
        }
    }
}

/// Body-mass index rounded to one decimal place, or `None` for non-positive inputs.
pub fn derive_bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if !(height_cm > 0.0 && weight_kg > 0.0) {
        return None;
    }
    let metres = height_cm / 100.0;
    let bmi = weight_kg / (metres * metres);
    Some((bmi * 10.0).round() / 10.0)
}
