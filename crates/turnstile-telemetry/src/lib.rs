//! Logging and metrics for Turnstile.
//!
//! - **Logging**: `tracing-subscriber` with an env filter and JSON or pretty
//!   output ([`init_logging`])
//! - **Metrics**: counters and a latency histogram through the `metrics`
//!   facade, exported in Prometheus format ([`init_metrics`])
//!
//! ```rust,ignore
//! use turnstile_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let telemetry = init_telemetry(&TelemetryConfig::builder().service_name("box-office").build())?;
//! if let Some(metrics) = telemetry.metrics() {
//!     println!("{}", metrics.render());
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installed telemetry.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    metrics: Option<MetricsRegistry>,
}

impl Telemetry {
    /// Returns the metrics registry, if metrics are enabled.
    #[must_use]
    pub fn metrics(&self) -> Option<&MetricsRegistry> {
        self.metrics.as_ref()
    }
}

/// Installs logging, then metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<Telemetry> {
    init_logging(&config.logging)?;
    let metrics = init_metrics(&config.metrics, &config.service_name)?;
    Ok(Telemetry { metrics })
}
