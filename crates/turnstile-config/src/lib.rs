//! Typed configuration for turnstile services.
//!
//! [`TurnstileConfig`] holds one section per concern:
//!
//! - `server`: bind address, timeouts and request body limit
//! - `pipeline`: correlation header and whether incoming ids are trusted
//! - `websocket`: message and frame limits, idle timeout
//! - `logging` and `metrics`: passed to `turnstile-telemetry`
//!
//! Unknown keys are rejected. [`ConfigLoader`] layers defaults, a file and
//! environment variables of the form `TURNSTILE__SECTION__KEY`.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_secs = 30
//! max_body_bytes = 1048576
//!
//! [pipeline]
//! correlation_header = "x-request-id"
//! trust_incoming_correlation = true
//!
//! [websocket]
//! idle_timeout_secs = 300
//!
//! [logging]
//! level = "info"
//! json = true
//! ```

mod config;
mod error;
mod loader;

pub use config::{PipelineSection, ServerSection, TurnstileConfig, WebSocketSection};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use turnstile_telemetry::{LogConfig, MetricsConfig};
