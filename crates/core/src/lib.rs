//! # CityCare Core
//!
//! Core business logic for the CityCare health-coordination backend.
//!
//! This crate contains pure data operations and flat-file persistence:
//! - The PIN-gated patient record store (upsert registration, partial updates)
//! - Append-only facility, appointment and alert collections
//! - A simulated vital-sign feed
//!
//! **No API concerns**: HTTP servers, CORS and request/response shapes belong in `api-rest`
//! and `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod repositories;
pub mod sensors;
pub mod storage;

pub use citycare_types::{NonEmptyText, TextError};
pub use config::CoreConfig;
pub use constants::DEFAULT_DATA_DIR;
pub use error::{PatientError, PatientResult};
pub use patient::{Consent, PatientPatch, PatientRecord};
pub use repositories::alerts::{Alert, AlertFeed, AlertKind};
pub use repositories::appointments::{Appointment, AppointmentBook};
pub use repositories::facilities::{Facility, FacilityCatalog};
pub use repositories::patients::{pins_match, PatientStore, Registration, UpdateOutcome};
pub use sensors::{Reading, SensorFeed, Stat};

use std::sync::Arc;

/// Collection sizes reported by the health endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    pub patients: usize,
    pub appointments: usize,
    pub alerts: usize,
    pub facilities: usize,
}

/// Every store the service owns, loaded once at startup.
///
/// Cloning is cheap; clones share the same stores.
#[derive(Clone, Debug)]
pub struct CityCare {
    cfg: Arc<CoreConfig>,
    patients: Arc<PatientStore>,
    facilities: Arc<FacilityCatalog>,
    appointments: Arc<AppointmentBook>,
    alerts: Arc<AlertFeed>,
    sensors: Arc<SensorFeed>,
}

impl CityCare {
    /// Loads every collection from the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if an existing collection file cannot be read or parsed.
    pub fn open(cfg: Arc<CoreConfig>) -> PatientResult<Self> {
        Ok(Self {
            patients: Arc::new(PatientStore::load(cfg.patients_file())?),
            facilities: Arc::new(FacilityCatalog::load(cfg.facilities_file())?),
            appointments: Arc::new(AppointmentBook::load(cfg.appointments_file())?),
            alerts: Arc::new(AlertFeed::load(cfg.alerts_file())?),
            sensors: Arc::new(SensorFeed::new()),
            cfg,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn patients(&self) -> &PatientStore {
        &self.patients
    }

    pub fn facilities(&self) -> &FacilityCatalog {
        &self.facilities
    }

    pub fn appointments(&self) -> &AppointmentBook {
        &self.appointments
    }

    pub fn alerts(&self) -> &AlertFeed {
        &self.alerts
    }

    pub fn sensors(&self) -> &SensorFeed {
        &self.sensors
    }

    pub fn counts(&self) -> PatientResult<Counts> {
        Ok(Counts {
            patients: self.patients.len()?,
            appointments: self.appointments.len()?,
            alerts: self.alerts.len()?,
            facilities: self.facilities.len()?,
        })
    }
}
