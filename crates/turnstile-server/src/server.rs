//! The HTTP server.
//!
//! One Tokio task per TCP connection drives a hyper HTTP/1.1 connection with
//! upgrades enabled. Each request is answered by, in order:
//!
//! 1. `GET /health` and, when a registry is attached, `GET /metrics`;
//! 2. a WebSocket route, if the request is a valid upgrade;
//! 3. the HTTP route for its method and path, run through the pipeline;
//! 4. a `404` rendered through the pipeline, so it still carries the
//!    correlation id.
//!
//! A request future lives inside its connection task. When the client goes
//! away hyper drops it, and with it whatever stage or operation was pending.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use turnstile_core::{Anonymous, ApiError, Authenticator};
use turnstile_middleware::{
    ContextFactory, HttpEndpoint, MiddlewareContext, Operation, Pipeline, Response, ResponseExt,
};
use turnstile_telemetry::metrics::record_request;
use turnstile_telemetry::MetricsRegistry;
use turnstile_ws::{
    accept, complete_upgrade, is_websocket_request, Gateway, GatewayBuilder, WebSocketConfig,
    WebSocketUpgrade,
};

use crate::config::{ServerConfig, ServerConfigBuilder};
use crate::error::{ServerError, ServerResult};
use crate::health::{HealthCheck, HEALTH_PATH};
use crate::router::{RouteMatch, Router};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Path of the Prometheus exposition endpoint.
pub const METRICS_PATH: &str = "/metrics";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Serves HTTP endpoints and WebSocket gateways behind one pipeline.
///
/// ```rust,no_run
/// use turnstile_server::Server;
///
/// # async fn run() -> Result<(), turnstile_server::ServerError> {
/// let server = Server::builder()
///     .http_addr("127.0.0.1:8080")
///     .build();
///
/// server.run().await
/// # }
/// ```
pub struct Server {
    config: ServerConfig,
    router: Router,
    pipeline: Pipeline,
    factory: Arc<ContextFactory>,
    authenticator: Arc<dyn Authenticator>,
    websocket: WebSocketConfig,
    health: HealthCheck,
    metrics: Option<MetricsRegistry>,
    tracker: ConnectionTracker,
    shutdown: ShutdownSignal,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("pipeline", &self.pipeline.stage_names())
            .field("websocket", &self.websocket)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the routing table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the health check.
    #[must_use]
    pub fn health(&self) -> &HealthCheck {
        &self.health
    }

    /// Returns the number of open HTTP and WebSocket connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.tracker.active_connections()
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr: SocketAddr =
            self.config
                .socket_addr()
                .map_err(|source| ServerError::InvalidAddress {
                    addr: self.config.http_addr().to_string(),
                    source,
                })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` triggers, then
    /// waits up to the shutdown timeout for open connections to finish.
    pub async fn serve(mut self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        self.shutdown = shutdown.clone();
        let server = Arc::new(self);

        info!(
            addr = %listener.local_addr()?,
            routes = server.router.route_count(),
            "server listening"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let token = server.tracker.acquire();
                        let server = Arc::clone(&server);
                        tokio::spawn(async move {
                            let _token = token;
                            server.handle_connection(stream, peer).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        server.health.set_draining();
        info!(
            active = server.tracker.active_connections(),
            "shutdown started, waiting for connections"
        );

        let drained = tokio::time::timeout(
            server.config.shutdown_timeout(),
            server.tracker.wait_for_shutdown(),
        )
        .await;

        if drained.is_err() {
            warn!(
                remaining = server.tracker.active_connections(),
                "shutdown timeout elapsed with open connections"
            );
        }

        info!("server stopped");
        Ok(())
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await) }
        });

        let connection = http1::Builder::new()
            .serve_connection(io, service)
            .with_upgrades();
        tokio::pin!(connection);

        tokio::select! {
            result = connection.as_mut() => {
                if let Err(e) = result {
                    debug!(%peer, error = %e, "connection ended with error");
                }
            }
            () = self.shutdown.recv() => {
                connection.as_mut().graceful_shutdown();
                if let Err(e) = connection.await {
                    debug!(%peer, error = %e, "connection ended with error during shutdown");
                }
            }
        }
    }

    /// Answers one request.
    ///
    /// WebSocket upgrades only complete when `request` came from a hyper
    /// connection; the upgraded stream is served on its own task.
    pub async fn handle<B>(&self, mut request: http::Request<B>) -> Response
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        if method == Method::GET {
            if path == HEALTH_PATH {
                return self.health.response();
            }
            if path == METRICS_PATH {
                if let Some(metrics) = &self.metrics {
                    return Response::bytes(
                        StatusCode::OK,
                        PROMETHEUS_CONTENT_TYPE,
                        Bytes::from(metrics.render()),
                    );
                }
            }
        }

        let upgrade = is_websocket_request(&request);
        match self.router.match_route(&method, &path, upgrade) {
            Some(RouteMatch::WebSocket(gateway)) => {
                let gateway = gateway.clone();
                self.upgrade(gateway, &mut request).await
            }
            Some(RouteMatch::Http(endpoint)) => {
                let endpoint = endpoint.clone();
                self.serve_http(Some(endpoint), request).await
            }
            None => self.serve_http(None, request).await,
        }
    }

    async fn serve_http<B>(&self, endpoint: Option<HttpEndpoint>, request: http::Request<B>) -> Response
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let timeout = self.config.request_timeout();
        let (parts, body) = request.into_parts();

        // Body failures still run the pipeline so they are correlated
        let (bytes, failure) = match tokio::time::timeout(timeout, self.read_body(body)).await {
            Ok(Ok(bytes)) => (bytes, None),
            Ok(Err(error)) => (Bytes::new(), Some(error)),
            Err(_) => {
                debug!(timeout = ?timeout, "request body not received in time");
                (Bytes::new(), Some(ApiError::timeout("request body not received in time")))
            }
        };

        let request = http::Request::from_parts(parts, Full::new(bytes));
        self.pipeline
            .process(MiddlewareContext::new(), request, move |ctx, request| {
                let context = ctx.request_context().cloned();
                let request_id = ctx.correlation_id();
                Box::pin(async move {
                    if let Some(error) = failure {
                        return Response::api_error(&error, Some(request_id));
                    }
                    let Some(endpoint) = endpoint else {
                        let error = ApiError::not_found(format!(
                            "no route for {} {}",
                            request.method(),
                            request.uri().path()
                        ));
                        return Response::api_error(&error, Some(request_id));
                    };

                    match tokio::time::timeout(timeout, endpoint.handle(context, request_id, request)).await {
                        Ok(response) => response,
                        Err(_) => {
                            warn!(
                                operation = endpoint.name(),
                                request_id = %request_id,
                                timeout = ?timeout,
                                "request timed out"
                            );
                            record_request("http", "error", timeout);
                            let error = ApiError::timeout(format!(
                                "request exceeded {}ms",
                                timeout.as_millis()
                            ));
                            Response::api_error(&error, Some(request_id))
                        }
                    }
                })
            })
            .await
    }

    async fn read_body<B>(&self, body: B) -> Result<Bytes, ApiError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let max = self.config.max_body_bytes();
        match Limited::new(body, max).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.is::<http_body_util::LengthLimitError>() => {
                debug!(max, "request body over limit");
                Err(ApiError::invalid_input(
                    "body",
                    Some(format!("payload too large: max {max} bytes")),
                ))
            }
            Err(e) => {
                debug!(error = %e, "failed to read request body");
                Err(ApiError::invalid_input("body", Some("failed to read request body")))
            }
        }
    }

    async fn upgrade<B>(&self, gateway: Gateway, request: &mut http::Request<B>) -> Response {
        let upgrade = match accept(request, &self.factory, self.authenticator.as_ref(), &[]).await {
            Ok(upgrade) => upgrade,
            Err(response) => return response,
        };
        let WebSocketUpgrade {
            response, session, ..
        } = upgrade;

        let on_upgrade = hyper::upgrade::on(request);
        let config = self.websocket.clone();
        let shutdown = self.shutdown.clone();
        let token = self.tracker.acquire();

        tokio::spawn(async move {
            let _token = token;
            let upgraded = match on_upgrade.await {
                Ok(upgraded) => upgraded,
                Err(e) => {
                    warn!(error = %e, "websocket upgrade failed");
                    return;
                }
            };

            let ws = complete_upgrade(TokioIo::new(upgraded), config, session).await;
            tokio::select! {
                // The gateway logs how the connection ended
                _ = gateway.serve(ws) => {}
                () = shutdown.recv() => debug!("websocket dropped for shutdown"),
            }
        });

        response
    }
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    config_builder: ServerConfigBuilder,
    factory: Option<ContextFactory>,
    authenticator: Option<Arc<dyn Authenticator>>,
    websocket: WebSocketConfig,
    operations: Vec<(Method, String, Arc<dyn turnstile_middleware::Endpoint>)>,
    endpoints: Vec<(Method, String, HttpEndpoint)>,
    gateways: Vec<(String, GatewayBuilder)>,
    metrics: Option<MetricsRegistry>,
    service_name: Option<String>,
    service_version: Option<String>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config_builder)
            .field("routes", &(self.operations.len() + self.endpoints.len()))
            .field("websocket_routes", &self.gateways.len())
            .finish_non_exhaustive()
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            config_builder: ServerConfigBuilder::new(),
            factory: None,
            authenticator: None,
            websocket: WebSocketConfig::default(),
            operations: Vec::new(),
            endpoints: Vec::new(),
            gateways: Vec::new(),
            metrics: None,
            service_name: None,
            service_version: None,
        }
    }
}

impl ServerBuilder {
    /// Replaces the whole server configuration.
    #[must_use]
    pub fn config(mut self, config: &ServerConfig) -> Self {
        self.config_builder = ServerConfigBuilder::new()
            .http_addr(config.http_addr())
            .shutdown_timeout(config.shutdown_timeout())
            .request_timeout(config.request_timeout())
            .max_body_bytes(config.max_body_bytes());
        self
    }

    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.http_addr(addr);
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.shutdown_timeout(timeout);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.request_timeout(timeout);
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.config_builder = self.config_builder.max_body_bytes(max);
        self
    }

    /// Sets how correlation ids are read and generated.
    #[must_use]
    pub fn context_factory(mut self, factory: ContextFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Sets the authenticator for HTTP requests and WebSocket handshakes.
    ///
    /// Defaults to [`Anonymous`].
    #[must_use]
    pub fn authenticator(mut self, authenticator: impl Authenticator) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Sets WebSocket limits.
    #[must_use]
    pub fn websocket_config(mut self, config: WebSocketConfig) -> Self {
        self.websocket = config;
        self
    }

    /// Routes `method path` to `operation`, using the server body limit.
    #[must_use]
    pub fn route<O: Operation>(mut self, method: Method, path: impl Into<String>, operation: O) -> Self {
        self.operations.push((method, path.into(), Arc::new(operation)));
        self
    }

    /// Routes `method path` to a configured endpoint.
    #[must_use]
    pub fn endpoint(mut self, method: Method, path: impl Into<String>, endpoint: HttpEndpoint) -> Self {
        self.endpoints.push((method, path.into(), endpoint));
        self
    }

    /// Serves WebSocket upgrades at `path`.
    ///
    /// The gateway gets the server's context factory.
    #[must_use]
    pub fn websocket(mut self, path: impl Into<String>, gateway: GatewayBuilder) -> Self {
        self.gateways.push((path.into(), gateway));
        self
    }

    /// Serves `registry` at [`METRICS_PATH`].
    #[must_use]
    pub fn metrics(mut self, registry: MetricsRegistry) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Sets the service name reported by `/health`.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Sets the service version reported by `/health`.
    #[must_use]
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let config = self.config_builder.build();
        let factory = self.factory.unwrap_or_default();
        let authenticator = self
            .authenticator
            .unwrap_or_else(|| Arc::new(Anonymous));

        let mut router = Router::new();
        for (method, path, endpoint) in self.operations {
            let endpoint = HttpEndpoint::new(endpoint).with_max_body_bytes(config.max_body_bytes());
            router.add_route(method, path, endpoint);
        }
        for (method, path, endpoint) in self.endpoints {
            router.add_route(method, path, endpoint);
        }
        for (path, gateway) in self.gateways {
            router.add_websocket(path, gateway.context_factory(factory.clone()).build());
        }

        let service = self.service_name.unwrap_or_else(|| "turnstile".to_string());
        let version = self
            .service_version
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        Server {
            pipeline: Pipeline::standard(factory.clone(), Arc::clone(&authenticator)),
            factory: Arc::new(factory),
            authenticator,
            config,
            router,
            websocket: self.websocket,
            health: HealthCheck::new(service, version),
            metrics: self.metrics,
            tracker: ConnectionTracker::new(),
            shutdown: ShutdownSignal::new(),
        }
    }
}
