//! Alert feed.
//!
//! Alerts are broadcast notices (medication reminders, new reports, emergencies). The optional
//! `target` names an audience such as `patient:PAT_001` or `role:doctor`; an alert without a
//! target is for everyone.

use crate::error::{PatientError, PatientResult};
use crate::storage::{now_millis, JsonCollection};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Med,
    Report,
    Emergency,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub title: String,
    pub msg: String,
    pub kind: AlertKind,
    #[serde(default)]
    pub target: Option<String>,
    /// Epoch milliseconds, stamped when the alert is created.
    #[serde(default)]
    pub ts: Option<i64>,
}

#[derive(Debug)]
pub struct AlertFeed {
    alerts: JsonCollection<Alert>,
}

impl AlertFeed {
    pub fn load(path: PathBuf) -> PatientResult<Self> {
        Ok(Self {
            alerts: JsonCollection::load(path)?,
        })
    }

    /// Stamps `ts` with the current time and appends the alert.
    ///
    /// Any caller-supplied `ts` is overwritten.
    pub fn create(&self, mut alert: Alert) -> PatientResult<Alert> {
        if alert.title.trim().is_empty() {
            return Err(PatientError::InvalidInput("title is required".into()));
        }
        alert.ts = Some(now_millis());
        let alert = self.alerts.append(alert)?;
        tracing::info!("alert created: {} ({:?})", alert.title, alert.kind);
        Ok(alert)
    }

    /// All alerts, or only those whose `target` equals `target` exactly.
    pub fn list(&self, target: Option<&str>) -> PatientResult<Vec<Alert>> {
        match target {
            Some(t) => self.alerts.filter(|a| a.target.as_deref() == Some(t)),
            None => self.alerts.all(),
        }
    }

    pub fn len(&self) -> PatientResult<usize> {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> PatientResult<bool> {
        self.alerts.is_empty()
    }
}
