//! Constants used throughout the CityCare core crate.
//!
//! This module contains all path and filename constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Default directory for collection files when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default shared PIN for doctor logins.
pub const DEFAULT_DOCTOR_PIN: &str = "1234";

/// Filename for the patient record collection.
pub const PATIENTS_FILENAME: &str = "patients.json";

/// Filename for the facility catalog.
pub const FACILITIES_FILENAME: &str = "facilities.json";

/// Filename for the appointment list.
pub const APPOINTMENTS_FILENAME: &str = "appointments.json";

/// Filename for the alert feed.
pub const ALERTS_FILENAME: &str = "alerts.json";

/// Suffix appended to a collection filename while its replacement is being written.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Number of sensor readings returned by a history query when no limit is given.
pub const DEFAULT_SENSOR_HISTORY_LIMIT: usize = 30;

/// Readings kept per patient and stat; older ones are dropped as new ones arrive.
pub const MAX_SENSOR_HISTORY: usize = 200;

/// Origins allowed by CORS when `CITYCARE_CORS_ORIGINS` is not set.
pub const DEFAULT_CORS_ORIGINS: [&str; 6] = [
    "http://127.0.0.1:5500",
    "http://localhost:5500",
    "http://127.0.0.1:3000",
    "http://localhost:3000",
    "http://127.0.0.1:8000",
    "http://localhost:8000",
];
