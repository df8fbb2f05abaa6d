//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    ALERTS_FILENAME, APPOINTMENTS_FILENAME, DEFAULT_CORS_ORIGINS, DEFAULT_DATA_DIR,
    DEFAULT_DOCTOR_PIN, FACILITIES_FILENAME, PATIENTS_FILENAME,
};
use crate::{PatientError, PatientResult};
use citycare_types::NonEmptyText;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    doctor_pin: NonEmptyText,
    cors_origins: Vec<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The data directory is created if it does not exist yet.
    pub fn new(
        data_dir: PathBuf,
        doctor_pin: NonEmptyText,
        cors_origins: Vec<String>,
    ) -> PatientResult<Self> {
        if data_dir.exists() && !data_dir.is_dir() {
            return Err(PatientError::InvalidInput(format!(
                "data directory path is not a directory: {}",
                data_dir.display()
            )));
        }
        std::fs::create_dir_all(&data_dir).map_err(PatientError::StorageDirCreation)?;

        Ok(Self {
            data_dir,
            doctor_pin,
            cors_origins,
        })
    }

    /// Resolve configuration from optional raw values, typically read from the environment
    /// by a binary's `main`.
    ///
    /// Missing or blank values fall back to the defaults in [`crate::constants`].
    pub fn from_values(
        data_dir: Option<String>,
        doctor_pin: Option<String>,
        cors_origins: Option<String>,
    ) -> PatientResult<Self> {
        let data_dir = non_blank(data_dir).unwrap_or_else(|| DEFAULT_DATA_DIR.into());
        let doctor_pin =
            NonEmptyText::new(non_blank(doctor_pin).unwrap_or_else(|| DEFAULT_DOCTOR_PIN.into()))?;
        let cors_origins = cors_origins_from_env_value(cors_origins);

        Self::new(PathBuf::from(data_dir), doctor_pin, cors_origins)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn patients_file(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_FILENAME)
    }

    pub fn facilities_file(&self) -> PathBuf {
        self.data_dir.join(FACILITIES_FILENAME)
    }

    pub fn appointments_file(&self) -> PathBuf {
        self.data_dir.join(APPOINTMENTS_FILENAME)
    }

    pub fn alerts_file(&self) -> PathBuf {
        self.data_dir.join(ALERTS_FILENAME)
    }

    pub fn doctor_pin(&self) -> &NonEmptyText {
        &self.doctor_pin
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated CORS origin list.
///
/// If `value` is `None` or contains no usable entries, returns the local development origins.
pub fn cors_origins_from_env_value(value: Option<String>) -> Vec<String> {
    let parsed: Vec<String> = value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
    } else {
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_values_applies_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("data");

        let cfg = CoreConfig::from_values(Some(dir.display().to_string()), None, None)
            .expect("config should resolve");

        assert!(dir.is_dir(), "data dir should be created");
        assert_eq!(cfg.doctor_pin().as_str(), DEFAULT_DOCTOR_PIN);
        assert_eq!(cfg.cors_origins().len(), DEFAULT_CORS_ORIGINS.len());
        assert_eq!(cfg.patients_file(), dir.join(PATIENTS_FILENAME));
    }

    #[test]
    fn blank_doctor_pin_falls_back_to_default() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = CoreConfig::from_values(
            Some(temp_dir.path().display().to_string()),
            Some("   ".into()),
            None,
        )
        .expect("config should resolve");

        assert_eq!(cfg.doctor_pin().as_str(), DEFAULT_DOCTOR_PIN);
    }

    #[test]
    fn rejects_data_dir_that_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = temp_dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();

        let err = CoreConfig::from_values(Some(file.display().to_string()), None, None)
            .expect_err("file path should be rejected");
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn cors_origins_parse_comma_separated_list() {
        let origins =
            cors_origins_from_env_value(Some(" https://a.example , ,https://b.example".into()));
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }
}
