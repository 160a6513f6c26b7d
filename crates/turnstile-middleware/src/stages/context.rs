//! Request context construction.
//!
//! [`ContextFactory`] turns an authenticated principal plus transport
//! request data into a [`RequestContext`]. It also owns the correlation
//! header: an absent or malformed id is replaced with a fresh UUID v7 that
//! is written back into the header map, so every later reader (including a
//! WebSocket handshake response) sees the same id.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::header::{HeaderName, HeaderValue, InvalidHeaderName};
use http::HeaderMap;
use std::sync::Arc;
use turnstile_core::{CorrelationId, Principal, RequestContext, Transport};

/// The default correlation header.
pub const DEFAULT_CORRELATION_HEADER: &str = "x-request-id";

/// Builds request contexts and resolves correlation ids.
///
/// # Example
///
/// ```
/// use http::HeaderMap;
/// use turnstile_core::{Principal, Transport};
/// use turnstile_middleware::stages::ContextFactory;
///
/// let factory = ContextFactory::default();
/// let mut headers = HeaderMap::new();
///
/// let ctx = factory
///     .build(Some(&Principal::new(9)), &mut headers, Transport::Http)
///     .unwrap();
///
/// // The generated id was written back.
/// assert_eq!(headers["x-request-id"], ctx.request_id().to_string().as_str());
///
/// // No principal, no context; the header is still resolved.
/// assert!(factory.build(None, &mut HeaderMap::new(), Transport::Http).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ContextFactory {
    header: HeaderName,
    trust_incoming: bool,
}

impl Default for ContextFactory {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_CORRELATION_HEADER))
    }
}

impl ContextFactory {
    /// Creates a factory reading `header`. Incoming ids are trusted.
    #[must_use]
    pub fn new(header: HeaderName) -> Self {
        Self {
            header,
            trust_incoming: true,
        }
    }

    /// Creates a factory from a header name string.
    pub fn from_header_name(header: &str) -> Result<Self, InvalidHeaderName> {
        HeaderName::from_bytes(header.trim().to_ascii_lowercase().as_bytes()).map(Self::new)
    }

    /// Sets whether well-formed incoming ids are kept.
    ///
    /// When `false`, every request gets a generated id.
    #[must_use]
    pub fn trust_incoming(mut self, trust: bool) -> Self {
        self.trust_incoming = trust;
        self
    }

    /// Returns the correlation header name.
    #[must_use]
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Reads the correlation id from `headers`, generating and writing back
    /// a fresh one when it is absent, malformed or untrusted.
    pub fn correlate(&self, headers: &mut HeaderMap) -> CorrelationId {
        let incoming = headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .and_then(CorrelationId::parse)
            .filter(|_| self.trust_incoming);

        if let Some(id) = incoming {
            return id;
        }

        let id = CorrelationId::new();
        match HeaderValue::from_str(&id.to_string()) {
            Ok(value) => {
                headers.insert(self.header.clone(), value);
            }
            Err(e) => tracing::warn!(error = %e, "generated correlation id is not a header value"),
        }
        tracing::debug!(request_id = %id, header = %self.header, "generated correlation id");
        id
    }

    /// Creates the context for `principal`, or nothing when unauthenticated.
    #[must_use]
    pub fn create(
        &self,
        principal: Option<&Principal>,
        request_id: CorrelationId,
        transport: Transport,
    ) -> Option<RequestContext> {
        principal.map(|p| RequestContext::new(p, request_id, transport))
    }

    /// Resolves the correlation id from `headers`, then creates the context.
    pub fn build(
        &self,
        principal: Option<&Principal>,
        headers: &mut HeaderMap,
        transport: Transport,
    ) -> Option<RequestContext> {
        let request_id = self.correlate(headers);
        self.create(principal, request_id, transport)
    }
}

/// Stores the [`RequestContext`] of authenticated HTTP requests in the
/// [`MiddlewareContext`].
#[derive(Debug, Clone)]
pub struct ContextMiddleware {
    factory: Arc<ContextFactory>,
}

impl ContextMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(factory: Arc<ContextFactory>) -> Self {
        Self { factory }
    }
}

impl Middleware for ContextMiddleware {
    fn name(&self) -> &'static str {
        "context"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let created = self
                .factory
                .create(ctx.principal(), ctx.correlation_id(), Transport::Http);
            if let Some(request_context) = created {
                ctx.set_request_context(request_context);
            }
            next.run(ctx, request).await
        })
    }
}
