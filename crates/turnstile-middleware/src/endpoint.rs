//! HTTP endpoint adapter.
//!
//! Turns an HTTP request that has passed the middleware chain into
//! [`Inbound`] input, dispatches it and renders the result:
//!
//! - envelopes as `200` JSON,
//! - binary bodies with their own content type,
//! - errors through [`ResponseExt::api_error`].

use crate::context::MiddlewareContext;
use crate::dispatch::{outcome, Endpoint, Inbound, Operation};
use crate::pipeline::Pipeline;
use crate::stages::Outgoing;
use crate::types::{Request, Response, ResponseExt};
use http::StatusCode;
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Instant;
use turnstile_core::{ApiError, CorrelationId, HostKind, RequestContext};
use turnstile_extract::{ExtractionContext, FromRequest, JsonBody, QueryMap, DEFAULT_MAX_BODY_SIZE};
use turnstile_telemetry::metrics::record_request;

/// An operation bound to HTTP.
#[derive(Clone)]
pub struct HttpEndpoint {
    endpoint: Arc<dyn Endpoint>,
    max_body_bytes: usize,
}

impl std::fmt::Debug for HttpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEndpoint")
            .field("operation", &self.endpoint.name())
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl HttpEndpoint {
    /// Wraps an endpoint.
    #[must_use]
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            endpoint,
            max_body_bytes: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Wraps an operation.
    #[must_use]
    pub fn from_operation<O: Operation>(operation: O) -> Self {
        Self::new(Arc::new(operation))
    }

    /// Sets the largest accepted body.
    #[must_use]
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.endpoint.name()
    }

    /// Runs `request` through `pipeline` and then this endpoint.
    pub async fn serve(&self, pipeline: &Pipeline, request: Request) -> Response {
        let endpoint = self.clone();
        pipeline
            .process(MiddlewareContext::new(), request, move |ctx, request| {
                let context = ctx.request_context().cloned();
                let request_id = ctx.correlation_id();
                Box::pin(async move { endpoint.handle(context, request_id, request).await })
            })
            .await
    }

    /// Extracts, dispatches and renders one request.
    ///
    /// Correlation, identity and context must already have run.
    pub async fn handle(
        &self,
        context: Option<RequestContext>,
        request_id: CorrelationId,
        request: Request,
    ) -> Response {
        let started = Instant::now();
        let result = self.invoke(context.as_ref(), request).await;

        let elapsed = context
            .as_ref()
            .map_or_else(|| started.elapsed(), RequestContext::elapsed);
        record_request("http", outcome(&result), elapsed);

        match result {
            Ok(Outgoing::Envelope(envelope)) => match serde_json::to_value(&envelope) {
                Ok(body) => Response::json(StatusCode::OK, &body),
                Err(e) => {
                    let error = ApiError::internal_with_source("failed to encode envelope", e);
                    Response::api_error(&error, Some(request_id))
                }
            },
            Ok(Outgoing::Binary(body)) => Response::bytes(StatusCode::OK, &body.content_type, body.bytes),
            Err(error) => {
                if error.status_code().is_server_error() {
                    tracing::error!(operation = self.name(), error = %error, "operation failed");
                }
                Response::api_error(&error, Some(request_id))
            }
        }
    }

    async fn invoke(
        &self,
        context: Option<&RequestContext>,
        request: Request,
    ) -> Result<Outgoing, ApiError> {
        let (parts, body) = request.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let extraction = ExtractionContext::new(parts.method, parts.uri, parts.headers, bytes);
        let QueryMap(query) = QueryMap::from_request(&extraction)?;
        let JsonBody(body) = JsonBody::with_limit(&extraction, self.max_body_bytes)?;

        self.endpoint
            .invoke(HostKind::Http, context, Inbound::new(query, body))
            .await
    }
}
