use crate::dto::HealthRes;
use citycare_core::Counts;

/// Simple health service shared by every API front end.
///
/// Reports liveness along with the size of each collection.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Builds the health response from current collection sizes.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health(counts: Counts) -> HealthRes {
        HealthRes {
            ok: true,
            message: "CityCare is alive".into(),
            patients: counts.patients,
            appointments: counts.appointments,
            alerts: counts.alerts,
            facilities: counts.facilities,
        }
    }
}
