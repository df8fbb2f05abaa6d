//! Simulated vital-sign feed.
//!
//! There is no device I/O. Each read draws a random value within a plausible resting range for
//! the requested vital, logs it against `(patient, stat)`, and returns it. The log is in-memory
//! only, keeps the newest [`MAX_SENSOR_HISTORY`] readings per key, and is lost on restart.

use crate::constants::MAX_SENSOR_HISTORY;
use crate::error::{PatientError, PatientResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::Mutex;
use utoipa::ToSchema;

/// A vital sign the simulator can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    HeartRate,
    O2,
    Temp,
}

impl Stat {
    pub fn unit(self) -> &'static str {
        match self {
            Stat::HeartRate => "bpm",
            Stat::O2 => "%",
            Stat::Temp => "°C",
        }
    }

    /// Inclusive range values are drawn from.
    fn range(self) -> (f64, f64) {
        match self {
            Stat::HeartRate => (60.0, 100.0),
            Stat::O2 => (94.0, 100.0),
            Stat::Temp => (36.1, 37.8),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stat::HeartRate => "heart_rate",
            Stat::O2 => "o2",
            Stat::Temp => "temp",
        }
    }
}

impl FromStr for Stat {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heart_rate" => Ok(Stat::HeartRate),
            "o2" => Ok(Stat::O2),
            "temp" => Ok(Stat::Temp),
            other => Err(PatientError::InvalidInput(format!(
                "unknown stat '{other}' (expected heart_rate, o2 or temp)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Reading {
    pub value: f64,
    pub unit: String,
    /// Epoch seconds.
    pub ts: i64,
}

/// Random vital generator with a bounded per-patient, per-stat reading log.
#[derive(Debug, Default)]
pub struct SensorFeed {
    log: Mutex<HashMap<(String, Stat), VecDeque<Reading>>>,
}

impl SensorFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates, records and returns a reading.
    pub fn read(&self, patient_id: &str, stat: Stat) -> PatientResult<Reading> {
        let (low, high) = stat.range();
        let raw = rand::thread_rng().gen_range(low..=high);
        let reading = Reading {
            value: (raw * 10.0).round() / 10.0,
            unit: stat.unit().to_string(),
            ts: chrono::Utc::now().timestamp(),
        };

        let mut log = self.log.lock().map_err(|_| PatientError::LockPoisoned)?;
        let readings = log.entry((patient_id.to_string(), stat)).or_default();
        if readings.len() >= MAX_SENSOR_HISTORY {
            readings.pop_front();
        }
        readings.push_back(reading.clone());

        tracing::debug!(
            "sensor {} {} = {} {}",
            patient_id,
            stat.as_str(),
            reading.value,
            reading.unit
        );
        Ok(reading)
    }

    /// Up to `limit` most recent readings, oldest first.
    pub fn history(&self, patient_id: &str, stat: Stat, limit: usize) -> PatientResult<Vec<Reading>> {
        let log = self.log.lock().map_err(|_| PatientError::LockPoisoned)?;
        let Some(readings) = log.get(&(patient_id.to_string(), stat)) else {
            return Ok(Vec::new());
        };
        let start = readings.len().saturating_sub(limit);
        Ok(readings.iter().skip(start).cloned().collect())
    }
}
