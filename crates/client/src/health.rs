//! Non-fatal liveness probe against `GET /health`.

use std::fmt;

use crate::api::ApiError;
use crate::service::JobService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// The service answered with a non-2xx status.
    Unhealthy(u16),
    /// The service could not be reached at all.
    Unreachable(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => f.write_str("healthy"),
            Self::Unhealthy(status) => write!(f, "health check failed with status {status}"),
            Self::Unreachable(reason) => write!(f, "cannot connect to the dubbing service: {reason}"),
        }
    }
}

/// Probe the service. Never fails; problems are logged as warnings.
pub async fn check_health(service: &dyn JobService) -> HealthStatus {
    let status = match service.health().await {
        Ok(()) => HealthStatus::Healthy,
        Err(ApiError::Api { status, .. }) => HealthStatus::Unhealthy(status),
        Err(e) => HealthStatus::Unreachable(e.to_string()),
    };

    if !status.is_healthy() {
        tracing::warn!(%status, "Dubbing service health check failed");
    }
    status
}
