//! Request and response bodies.
//!
//! Field names match the JSON the browser front end sends and expects.

use citycare_core::{Alert, Appointment, PatientPatch, PatientRecord, Reading};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
    pub patients: usize,
    pub appointments: usize,
    pub alerts: usize,
    pub facilities: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub ok: bool,
    pub detail: String,
}

impl ErrorRes {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Registration body. Any other patient fields the caller sends are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegisterPatientReq {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub pin: String,
    #[serde(default)]
    pub assigned_doctor_id: Option<String>,
    #[serde(default)]
    pub facility_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RegisterPatientRes {
    pub ok: bool,
    pub created: bool,
    pub patient: PatientRecord,
}

/// Update body: identifier and PIN plus any subset of the editable fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientReq {
    pub user_id: String,
    #[serde(default)]
    pub pin: String,
    #[serde(flatten)]
    pub patch: PatientPatch,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdatePatientRes {
    pub ok: bool,
    pub changed: bool,
    pub updated: PatientRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub user_id: String,
    pub pin: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginRes {
    pub user: SessionUser,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookAppointmentRes {
    pub ok: bool,
    pub appointment: Appointment,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateAlertRes {
    pub ok: bool,
    pub alert: Alert,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorReadingRes {
    pub patient_id: String,
    pub stat: String,
    pub value: f64,
    pub unit: String,
    pub ts: i64,
}

impl SensorReadingRes {
    pub fn new(patient_id: String, stat: &str, reading: Reading) -> Self {
        Self {
            patient_id,
            stat: stat.to_string(),
            value: reading.value,
            unit: reading.unit,
            ts: reading.ts,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorHistoryRes {
    pub patient_id: String,
    pub stat: String,
    pub history: Vec<Reading>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_flattens_patch_fields() {
        let req: UpdatePatientReq = serde_json::from_str(
            r#"{"user_id":"p1","pin":"0000","name":"Asha","age":34,"bmi":null}"#,
        )
        .unwrap();
        assert_eq!(req.user_id, "p1");
        assert_eq!(req.patch.name.as_deref(), Some("Asha"));
        assert_eq!(req.patch.age, Some(34));
        assert_eq!(req.patch.bmi, None);
    }

    #[test]
    fn update_request_without_pin_parses_as_empty_pin() {
        let req: UpdatePatientReq = serde_json::from_str(r#"{"user_id":"p1"}"#).unwrap();
        assert_eq!(req.pin, "");
    }

    #[test]
    fn register_request_ignores_profile_fields() {
        let req: RegisterPatientReq = serde_json::from_str(
            r#"{"user_id":"p1","pin":"0000","name":"ignored","facility_id":"IND_HSP_001"}"#,
        )
        .unwrap();
        assert_eq!(req.facility_id.as_deref(), Some("IND_HSP_001"));
        assert_eq!(req.assigned_doctor_id, None);
    }
}
