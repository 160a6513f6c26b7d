//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while installing telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber or recorder is already installed.
    #[error("{0} already initialized")]
    AlreadyInitialized(&'static str),

    /// Failed to initialize metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::MetricsInit("bad buckets".to_string());
        assert_eq!(err.to_string(), "Failed to initialize metrics: bad buckets");

        let err = TelemetryError::AlreadyInitialized("logging");
        assert_eq!(err.to_string(), "logging already initialized");
    }
}
