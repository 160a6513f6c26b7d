//! Pipeline metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `turnstile_requests_total` | Counter | `transport`, `outcome` |
//! | `turnstile_request_duration_seconds` | Histogram | `transport` |
//! | `turnstile_validation_failures_total` | Counter | `code` |
//! | `turnstile_envelopes_total` | Counter | `kind` |
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init_metrics`].

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Metric names.
pub mod names {
    /// Requests and messages completed.
    pub const REQUESTS_TOTAL: &str = "turnstile_requests_total";
    /// Request latency.
    pub const REQUEST_DURATION_SECONDS: &str = "turnstile_request_duration_seconds";
    /// Rejected inputs.
    pub const VALIDATION_FAILURES_TOTAL: &str = "turnstile_validation_failures_total";
    /// Responses produced by the envelope stage.
    pub const ENVELOPES_TOTAL: &str = "turnstile_envelopes_total";
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Renders the installed recorder in Prometheus text format.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Wraps a handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Renders all metrics.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Installs the Prometheus recorder.
///
/// Returns `None` when metrics are disabled. The exposition text is served
/// by the application (see [`MetricsRegistry::render`]); no listener is
/// started here.
pub fn init_metrics(
    config: &MetricsConfig,
    service_name: &str,
) -> TelemetryResult<Option<MetricsRegistry>> {
    if !config.enabled {
        return Ok(None);
    }
    if METRICS_HANDLE.get().is_some() {
        return Err(TelemetryError::AlreadyInitialized("metrics"));
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", service_name)
        .set_buckets_for_metric(
            Matcher::Full(names::REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle.clone());
    describe_metrics();

    Ok(Some(MetricsRegistry::new(handle)))
}

/// Renders metrics if a recorder was installed.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(
        names::REQUESTS_TOTAL,
        "Requests and messages completed, by transport and outcome"
    );
    describe_histogram!(
        names::REQUEST_DURATION_SECONDS,
        "Time from context creation to response, in seconds"
    );
    describe_counter!(
        names::VALIDATION_FAILURES_TOTAL,
        "Inputs rejected by validation, by error code"
    );
    describe_counter!(
        names::ENVELOPES_TOTAL,
        "Responses produced, by kind (data, envelope, binary)"
    );
}

/// Records a completed request or message.
pub fn record_request(transport: &'static str, outcome: &'static str, duration: Duration) {
    counter!(names::REQUESTS_TOTAL, "transport" => transport, "outcome" => outcome).increment(1);
    histogram!(names::REQUEST_DURATION_SECONDS, "transport" => transport)
        .record(duration.as_secs_f64());
}

/// Records a validation rejection.
pub fn record_validation_failure(code: &'static str) {
    counter!(names::VALIDATION_FAILURES_TOTAL, "code" => code).increment(1);
}

/// Records a response leaving the envelope stage.
pub fn record_envelope(kind: &'static str) {
    counter!(names::ENVELOPES_TOTAL, "kind" => kind).increment(1);
}
