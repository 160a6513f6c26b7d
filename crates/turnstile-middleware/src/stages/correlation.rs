//! Correlation id middleware.
//!
//! Resolves the request's correlation id through the [`ContextFactory`],
//! stores it in the [`MiddlewareContext`] and echoes it on the response
//! under the same header. Everything below this stage runs inside a span
//! carrying the id.

use super::context::ContextFactory;
use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::HeaderValue;
use std::sync::Arc;
use tracing::Instrument;

/// Middleware that resolves and propagates the correlation id.
#[derive(Debug, Clone)]
pub struct CorrelationMiddleware {
    factory: Arc<ContextFactory>,
}

impl CorrelationMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(factory: Arc<ContextFactory>) -> Self {
        Self { factory }
    }
}

impl Middleware for CorrelationMiddleware {
    fn name(&self) -> &'static str {
        "correlation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = self.factory.correlate(request.headers_mut());
            ctx.set_correlation_id(request_id);

            let span = tracing::debug_span!(
                "request",
                request_id = %request_id,
                method = %request.method(),
                path = request.uri().path(),
            );
            let mut response = next.run(ctx, request).instrument(span).await;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response
                    .headers_mut()
                    .insert(self.factory.header().clone(), value);
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;
    use turnstile_core::CorrelationId;

    fn request(id: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/rooms");
        if let Some(id) = id {
            builder = builder.header("x-request-id", id);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn echo_handler<'a>() -> Next<'a> {
        Next::handler(|_ctx, req| {
            let seen = req
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Box::pin(async move { Response::bytes(StatusCode::OK, "text/plain", Bytes::from(seen)) })
        })
    }

    #[tokio::test]
    async fn test_generated_id_reaches_handler_context_and_response() {
        let middleware = CorrelationMiddleware::new(Arc::new(ContextFactory::default()));
        let mut ctx = MiddlewareContext::new();

        let response = middleware.process(&mut ctx, request(None), echo_handler()).await;

        let header = response.headers()["x-request-id"].to_str().unwrap().to_string();
        assert_eq!(header, ctx.correlation_id().to_string());
        assert!(CorrelationId::parse(&header).is_some());

        let seen = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(seen, header.as_bytes());
    }

    #[tokio::test]
    async fn test_incoming_id_is_echoed() {
        let incoming = "0190b3a8-5d4e-7c3a-9f1b-2a6c8e4d7f01";
        let middleware = CorrelationMiddleware::new(Arc::new(ContextFactory::default()));
        let mut ctx = MiddlewareContext::new();

        let response = middleware
            .process(&mut ctx, request(Some(incoming)), echo_handler())
            .await;

        assert_eq!(response.headers()["x-request-id"], incoming);
        assert_eq!(ctx.correlation_id().to_string(), incoming);
    }

    #[test]
    fn test_middleware_name() {
        let middleware = CorrelationMiddleware::new(Arc::new(ContextFactory::default()));
        assert_eq!(middleware.name(), "correlation");
    }
}
