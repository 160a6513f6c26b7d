//! Configuration types.
//!
//! Every section has defaults and rejects unknown keys, so a typo in a file
//! fails loading instead of being ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use turnstile_telemetry::{LogConfig, MetricsConfig};

use crate::ConfigError;

/// Complete service configuration.
///
/// ```
/// use turnstile_config::TurnstileConfig;
///
/// let config = TurnstileConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.pipeline.correlation_header, "x-request-id");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TurnstileConfig {
    /// Listener, timeouts and body limit.
    #[serde(default)]
    pub server: ServerSection,

    /// Correlation handling.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// WebSocket limits.
    #[serde(default)]
    pub websocket: WebSocketSection,

    /// Logging.
    #[serde(default)]
    pub logging: LogConfig,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address.
    pub http_addr: String,
    /// Graceful shutdown timeout in seconds.
    pub shutdown_timeout_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            shutdown_timeout_secs: 30,
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerSection {
    /// Returns the shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    /// Header carrying the correlation id.
    pub correlation_header: String,
    /// Whether a valid incoming correlation id is kept.
    pub trust_incoming_correlation: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            correlation_header: "x-request-id".to_string(),
            trust_incoming_correlation: true,
        }
    }
}

/// `[websocket]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WebSocketSection {
    /// Largest message.
    pub max_message_size: usize,
    /// Largest frame.
    pub max_frame_size: usize,
    /// Idle seconds before a connection is closed. `0` disables.
    pub idle_timeout_secs: u64,
}

impl Default for WebSocketSection {
    fn default() -> Self {
        Self {
            max_message_size: 64 << 20,
            max_frame_size: 16 << 20,
            idle_timeout_secs: 300,
        }
    }
}

impl WebSocketSection {
    /// Returns the idle timeout, or `None` when disabled.
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl TurnstileConfig {
    /// Debug logging in pretty format.
    ///
    /// ```
    /// use turnstile_config::TurnstileConfig;
    ///
    /// let config = TurnstileConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(!config.logging.json);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Info logging in JSON. Incoming correlation ids are not trusted.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LogConfig::production(),
            pipeline: PipelineSection {
                trust_incoming_correlation: false,
                ..PipelineSection::default()
            },
            ..Self::default()
        }
    }

    /// Validates values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than 0",
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than 0",
            ));
        }

        let header = self.pipeline.correlation_header.trim();
        if header.is_empty() {
            return Err(ConfigError::invalid_value(
                "pipeline.correlation_header",
                "must not be empty",
            ));
        }
        if http::HeaderName::from_bytes(header.as_bytes()).is_err() {
            return Err(ConfigError::invalid_value(
                "pipeline.correlation_header",
                format!("invalid header name: {header}"),
            ));
        }

        if self.websocket.max_message_size == 0 {
            return Err(ConfigError::invalid_value(
                "websocket.max_message_size",
                "must be greater than 0",
            ));
        }

        if self.websocket.max_frame_size == 0
            || self.websocket.max_frame_size > self.websocket.max_message_size
        {
            return Err(ConfigError::invalid_value(
                "websocket.max_frame_size",
                "must be greater than 0 and at most websocket.max_message_size",
            ));
        }

        validate_log_level(&self.logging.level)
    }
}

/// Accepts a level (`info`) or comma-separated `target=level` directives.
fn validate_log_level(filter: &str) -> Result<(), ConfigError> {
    if filter.trim().is_empty() {
        return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
    }

    for directive in filter.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        let level = directive.rsplit_once('=').map_or(directive, |(_, level)| level);
        if level.parse::<tracing::level_filters::LevelFilter>().is_err() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("invalid level in directive {directive:?}"),
            ));
        }
    }
    Ok(())
}
