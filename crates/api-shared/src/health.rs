use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Liveness check for the ResQ server. Reports alive whenever the process can answer.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "ResQ is alive".into(),
        }
    }
}
