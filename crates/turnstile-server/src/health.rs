//! The built-in `/health` endpoint.
//!
//! Reports `healthy` with `200` while the server accepts traffic and
//! `draining` with `503` once shutdown has started, so load balancers stop
//! routing to an instance that is closing its connections.
//!
//! ```rust
//! use turnstile_server::HealthCheck;
//!
//! let health = HealthCheck::new("rooms", "1.0.0");
//! assert!(health.status().is_healthy());
//!
//! health.set_draining();
//! assert_eq!(health.status().status(), "draining");
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use turnstile_middleware::{Response, ResponseExt};

/// Path served by [`HealthCheck`].
pub const HEALTH_PATH: &str = "/health";

/// Body of the `/health` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    status: String,
    service: String,
    version: String,
    uptime_seconds: u64,
}

impl HealthStatus {
    /// Creates a status.
    #[must_use]
    pub fn new(
        status: impl Into<String>,
        service: impl Into<String>,
        version: impl Into<String>,
        uptime: Duration,
    ) -> Self {
        Self {
            status: status.into(),
            service: service.into(),
            version: version.into(),
            uptime_seconds: uptime.as_secs(),
        }
    }

    /// Returns `healthy` or `draining`.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the uptime in whole seconds.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.uptime_seconds
    }

    /// Returns true while the server accepts traffic.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Liveness state of a server. Clones share the draining flag.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    started_at: Instant,
    draining: Arc<AtomicBool>,
}

impl HealthCheck {
    /// Creates a health check that starts healthy.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            started_at: Instant::now(),
            draining: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Marks the server as shutting down.
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::SeqCst);
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        let status = if self.draining.load(Ordering::SeqCst) {
            "draining"
        } else {
            "healthy"
        };
        HealthStatus::new(status, &self.service, &self.version, self.uptime())
    }

    /// Returns the time since creation.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Renders the `/health` response.
    #[must_use]
    pub fn response(&self) -> Response {
        let status = self.status();
        let code = if status.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        match serde_json::to_value(&status) {
            Ok(body) => Response::json(code, &body),
            Err(_) => Response::json(code, &serde_json::Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_health_check_starts_healthy() {
        let health = HealthCheck::new("rooms", "1.2.3");
        let status = health.status();

        assert!(status.is_healthy());
        assert_eq!(status.service(), "rooms");
        assert_eq!(status.version(), "1.2.3");
    }

    #[test]
    fn test_draining_is_shared_between_clones() {
        let health = HealthCheck::new("rooms", "1.0.0");
        let clone = health.clone();

        clone.set_draining();
        assert_eq!(health.status().status(), "draining");
    }

    #[test]
    fn test_status_serialization() {
        let status = HealthStatus::new("healthy", "rooms", "1.0.0", Duration::from_secs(42));
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["status"], "healthy");
        assert_eq!(json["uptime_seconds"], 42);
    }

    #[tokio::test]
    async fn test_response_codes() {
        let health = HealthCheck::new("rooms", "1.0.0");
        let response = health.response();
        assert_eq!(response.status(), StatusCode::OK);

        health.set_draining();
        let response = health.response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: HealthStatus = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status(), "draining");
    }
}
