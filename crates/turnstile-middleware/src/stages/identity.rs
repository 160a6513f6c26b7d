//! Identity middleware.
//!
//! Asks the configured [`Authenticator`] who is calling. Anonymous requests
//! continue without a principal; rejected credentials end the request with
//! the authenticator's error.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use std::sync::Arc;
use turnstile_core::Authenticator;

/// Middleware that resolves the caller's principal.
#[derive(Clone)]
pub struct IdentityMiddleware {
    authenticator: Arc<dyn Authenticator>,
}

impl std::fmt::Debug for IdentityMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityMiddleware").finish_non_exhaustive()
    }
}

impl IdentityMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl Middleware for IdentityMiddleware {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.authenticator.authenticate(request.headers()).await {
                Ok(Some(principal)) => {
                    tracing::debug!(principal_id = principal.id(), "authenticated");
                    ctx.set_principal(principal);
                }
                Ok(None) => tracing::trace!("anonymous request"),
                Err(error) => {
                    tracing::info!(error = %error, "authentication rejected");
                    return Response::api_error(&error, Some(ctx.correlation_id()));
                }
            }
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;
    use turnstile_core::{Anonymous, HeaderAuthenticator, PRINCIPAL_ID_HEADER, PRINCIPAL_ROLES_HEADER};

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = HttpRequest::builder().uri("/rooms");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn ok_handler<'a>() -> Next<'a> {
        Next::handler(|_ctx, _req| {
            Box::pin(async { Response::bytes(StatusCode::OK, "text/plain", Bytes::from("OK")) })
        })
    }

    #[tokio::test]
    async fn test_principal_is_stored() {
        let middleware = IdentityMiddleware::new(Arc::new(HeaderAuthenticator::new()));
        let mut ctx = MiddlewareContext::new();
        let req = request(&[(PRINCIPAL_ID_HEADER, "42"), (PRINCIPAL_ROLES_HEADER, "admin, usher")]);

        let response = middleware.process(&mut ctx, req, ok_handler()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let principal = ctx.principal().unwrap();
        assert_eq!(principal.id(), 42);
        assert!(principal.roles().contains("usher"));
    }

    #[tokio::test]
    async fn test_anonymous_continues() {
        let middleware = IdentityMiddleware::new(Arc::new(Anonymous));
        let mut ctx = MiddlewareContext::new();

        let response = middleware.process(&mut ctx, request(&[]), ok_handler()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(ctx.principal().is_none());
    }

    #[tokio::test]
    async fn test_rejected_credentials_short_circuit() {
        let middleware = IdentityMiddleware::new(Arc::new(HeaderAuthenticator::new()));
        let mut ctx = MiddlewareContext::new();
        let req = request(&[(PRINCIPAL_ID_HEADER, "not-a-number")]);

        let response = middleware.process(&mut ctx, req, ok_handler()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(ctx.principal().is_none());
    }
}
