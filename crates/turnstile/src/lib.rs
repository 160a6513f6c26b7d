//! # Turnstile
//!
//! A transport-agnostic request pipeline. One set of operations is served
//! over HTTP and over WebSocket events, and both transports run the same
//! stages:
//!
//! ```text
//! Correlation → Identity → Context → Injection → Validation → Stripping
//!     → Operation → Serialization filter → Response envelope
//! ```
//!
//! Query and body payloads are validated and coerced before an operation
//! sees them, responses drop every field their type does not expose, and
//! every result leaves in the same `{ data, meta }` envelope.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use turnstile::prelude::*;
//!
//! struct Ping;
//!
//! impl Operation for Ping {
//!     type Query = Empty;
//!     type Body = Empty;
//!
//!     fn name(&self) -> &'static str {
//!         "ping"
//!     }
//!
//!     fn call<'a>(
//!         &'a self,
//!         _context: Option<&'a RequestContext>,
//!         _input: Input<Empty, Empty>,
//!     ) -> BoxFuture<'a, Result<Reply, ApiError>> {
//!         Box::pin(async { Ok(Reply::untyped(serde_json::json!("pong"))) })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_optional_file("turnstile.toml")?
//!         .with_env_prefix("TURNSTILE")
//!         .load()?;
//!
//!     let telemetry = turnstile::init_telemetry(&config, "ping-service")?;
//!     let mut builder = turnstile::server_builder(&config)?
//!         .route(Method::GET, "/ping", Ping)
//!         .websocket("/events", Gateway::builder().event("ping", Ping));
//!     if let Some(metrics) = telemetry.metrics() {
//!         builder = builder.metrics(metrics.clone());
//!     }
//!
//!     builder.build().run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use turnstile_config as config;
pub use turnstile_core as core;
pub use turnstile_extract as extract;
pub use turnstile_middleware as middleware;
pub use turnstile_server as server;
pub use turnstile_telemetry as telemetry;
pub use turnstile_validate as validate;
pub use turnstile_ws as ws;

use turnstile_config::{ConfigError, TurnstileConfig};
use turnstile_middleware::ContextFactory;
use turnstile_server::{ServerBuilder, ServerError};
use turnstile_telemetry::{Telemetry, TelemetryConfig, TelemetryError};
use turnstile_ws::WebSocketConfig;

/// Errors raised while assembling a service from configuration.
#[derive(Debug, thiserror::Error)]
pub enum TurnstileError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The correlation header is not a valid header name.
    #[error("invalid correlation header: {0}")]
    CorrelationHeader(#[from] http::header::InvalidHeaderName),

    /// The server failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Installs logging and metrics from the `logging` and `metrics` sections.
pub fn init_telemetry(
    config: &TurnstileConfig,
    service_name: &str,
) -> Result<Telemetry, TurnstileError> {
    let telemetry = TelemetryConfig::builder()
        .service_name(service_name)
        .logging(config.logging.clone())
        .metrics(config.metrics.clone())
        .build();
    Ok(turnstile_telemetry::init_telemetry(&telemetry)?)
}

/// Returns the correlation settings of `config` as a [`ContextFactory`].
pub fn context_factory(config: &TurnstileConfig) -> Result<ContextFactory, TurnstileError> {
    Ok(ContextFactory::from_header_name(&config.pipeline.correlation_header)?
        .trust_incoming(config.pipeline.trust_incoming_correlation))
}

/// Returns the WebSocket limits of `config`.
#[must_use]
pub fn websocket_config(config: &TurnstileConfig) -> WebSocketConfig {
    WebSocketConfig::new()
        .max_message_size(config.websocket.max_message_size)
        .max_frame_size(config.websocket.max_frame_size)
        .idle_timeout(config.websocket.idle_timeout())
}

/// Validates `config` and returns a server builder carrying its settings.
///
/// Routes, gateways, the authenticator and the metrics registry are added
/// by the caller.
pub fn server_builder(config: &TurnstileConfig) -> Result<ServerBuilder, TurnstileError> {
    config.validate()?;

    tracing::debug!(
        addr = %config.server.http_addr,
        correlation_header = %config.pipeline.correlation_header,
        "building server from configuration"
    );

    Ok(ServerBuilder::default()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(config.server.shutdown_timeout())
        .request_timeout(config.server.request_timeout())
        .max_body_bytes(config.server.max_body_bytes)
        .context_factory(context_factory(config)?)
        .websocket_config(websocket_config(config)))
}

/// Common imports.
///
/// ```rust
/// use turnstile::prelude::*;
/// ```
pub mod prelude {
    pub use turnstile_config::{ConfigLoader, TurnstileConfig};
    pub use turnstile_core::{
        ApiError, ApiResult, Authenticator, BoxFuture, CorrelationId, HeaderAuthenticator,
        Principal, RequestContext, Transport,
    };
    pub use turnstile_extract::{Exposed, ExposedField, ExposureSchema, Reply};
    pub use turnstile_middleware::{ContextFactory, HttpEndpoint, Input, Operation};
    pub use turnstile_server::{Server, ServerBuilder, ShutdownSignal};
    pub use turnstile_validate::{Empty, PaginationParams, Validate};
    pub use turnstile_ws::{Gateway, GatewayBuilder, WebSocketConfig};
}
