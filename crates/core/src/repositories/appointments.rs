//! Appointment list.
//!
//! Bookings are appended as given; nothing checks for clashes, duplicates, or that the patient
//! and doctor exist.

use crate::error::{PatientError, PatientResult};
use crate::storage::JsonCollection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    pub reason: String,
}

impl Appointment {
    fn validate(&self) -> PatientResult<()> {
        let fields = [
            ("patient_id", &self.patient_id),
            ("doctor_id", &self.doctor_id),
            ("date", &self.date),
            ("time", &self.time),
            ("reason", &self.reason),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(PatientError::InvalidInput(format!("{name} is required")));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct AppointmentBook {
    appointments: JsonCollection<Appointment>,
}

impl AppointmentBook {
    pub fn load(path: PathBuf) -> PatientResult<Self> {
        Ok(Self {
            appointments: JsonCollection::load(path)?,
        })
    }

    /// Appends a booking.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidInput`] if any field is blank, or a storage error if the
    /// list cannot be written.
    pub fn book(&self, appointment: Appointment) -> PatientResult<Appointment> {
        appointment.validate()?;
        let appointment = self.appointments.append(appointment)?;
        tracing::info!(
            "booked appointment for {} with {} on {} {}",
            appointment.patient_id,
            appointment.doctor_id,
            appointment.date,
            appointment.time
        );
        Ok(appointment)
    }

    pub fn list(&self) -> PatientResult<Vec<Appointment>> {
        self.appointments.all()
    }

    pub fn for_doctor(&self, doctor_id: &str) -> PatientResult<Vec<Appointment>> {
        self.appointments.filter(|a| a.doctor_id == doctor_id)
    }

    pub fn len(&self) -> PatientResult<usize> {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> PatientResult<bool> {
        self.appointments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::APPOINTMENTS_FILENAME;
    use tempfile::TempDir;

    fn appointment(doctor_id: &str) -> Appointment {
        Appointment {
            patient_id: "PAT_001".into(),
            doctor_id: doctor_id.into(),
            date: "2026-10-20".into(),
            time: "10:30".into(),
            reason: "follow-up".into(),
        }
    }

    #[test]
    fn test_book_appends_duplicates_and_filters_by_doctor() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let book = AppointmentBook::load(temp_dir.path().join(APPOINTMENTS_FILENAME)).unwrap();

        book.book(appointment("DOC_1")).unwrap();
        book.book(appointment("DOC_2")).unwrap();
        book.book(appointment("DOC_1")).unwrap();

        assert_eq!(book.len().unwrap(), 3);
        assert_eq!(book.for_doctor("DOC_1").unwrap().len(), 2);
        assert!(book.for_doctor("DOC_3").unwrap().is_empty());
    }

    #[test]
    fn test_book_rejects_blank_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let book = AppointmentBook::load(temp_dir.path().join(APPOINTMENTS_FILENAME)).unwrap();

        let mut bad = appointment("DOC_1");
        bad.reason = "  ".into();
        let err = book.book(bad).unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(ref m) if m.contains("reason")));
        assert!(book.is_empty().unwrap());
    }
}
