//! Fixed-order pipeline.
//!
//! ## Stages
//!
//! | # | Stage | Runs in |
//! |---|-------|---------|
//! | 1 | Correlation | HTTP middleware / WebSocket handshake |
//! | 2 | Identity | HTTP middleware / WebSocket handshake |
//! | 3 | Context | HTTP middleware / per WebSocket message |
//! | 4 | Injection | [`dispatch`](crate::dispatch) |
//! | 5 | Validation | [`dispatch`](crate::dispatch) |
//! | 6 | Stripping | [`dispatch`](crate::dispatch) |
//! | - | *operation* | |
//! | 7 | Serialization | [`dispatch`](crate::dispatch) |
//! | 8 | Envelope | [`dispatch`](crate::dispatch) |
//!
//! Stages 1-3 are [`Middleware`] on HTTP. The [`Pipeline`] holds them in
//! that order; [`Pipeline::standard`] is the only way the server builds one.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{ContextFactory, ContextMiddleware, CorrelationMiddleware, IdentityMiddleware};
use crate::types::{Request, Response};
use std::sync::Arc;
use turnstile_core::Authenticator;

/// A type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The HTTP middleware chain.
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The correlation, identity and context stages, in that order.
    #[must_use]
    pub fn standard(factory: ContextFactory, authenticator: Arc<dyn Authenticator>) -> Self {
        let factory = Arc::new(factory);
        Self::builder()
            .stage(CorrelationMiddleware::new(Arc::clone(&factory)))
            .stage(IdentityMiddleware::new(authenticator))
            .stage(ContextMiddleware::new(factory))
            .build()
    }

    /// Runs the request through every stage, then `handler`.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        self.stages
            .iter()
            .rev()
            .fold(Next::handler(handler), |next, middleware| {
                Next::new(middleware.as_ref(), next)
            })
    }

    /// Returns the stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Appends a stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Read or generate the correlation id.
    Correlation = 1,
    /// Authenticate the caller.
    Identity = 2,
    /// Build the request context.
    Context = 3,
    /// Attach the context to the body.
    Injection = 4,
    /// Validate query and body.
    Validation = 5,
    /// Detach the context from the body.
    Stripping = 6,
    // --- operation ---
    /// Project the result onto its allow-list.
    Serialization = 7,
    /// Wrap the result.
    Envelope = 8,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Correlation => "correlation",
            Self::Identity => "identity",
            Self::Context => "context",
            Self::Injection => "injection",
            Self::Validation => "validation",
            Self::Stripping => "stripping",
            Self::Serialization => "serialization",
            Self::Envelope => "envelope",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;
    use std::sync::Mutex;
    use turnstile_core::HeaderAuthenticator;

    struct OrderTrackingMiddleware {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.order.lock().unwrap().push(self.name);
                next.run(ctx, request).await
            })
        }
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let track = |name| OrderTrackingMiddleware {
            name,
            order: Arc::clone(&order),
        };

        let pipeline = Pipeline::builder()
            .stage(track("first"))
            .stage(track("second"))
            .stage(track("third"))
            .build();

        let handler_order = Arc::clone(&order);
        let response = pipeline
            .process(MiddlewareContext::new(), request(), move |_ctx, _req| {
                handler_order.lock().unwrap().push("handler");
                Box::pin(async { Response::json(StatusCode::OK, &serde_json::json!({})) })
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third", "handler"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let pipeline = Pipeline::builder().build();
        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Response::json(StatusCode::ACCEPTED, &serde_json::json!({})) })
            })
            .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(pipeline.stage_count(), 0);
    }

    #[test]
    fn test_standard_stage_order() {
        let pipeline = Pipeline::standard(ContextFactory::default(), Arc::new(HeaderAuthenticator));
        assert_eq!(pipeline.stage_names(), vec!["correlation", "identity", "context"]);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Context < Stage::Injection);
        assert!(Stage::Stripping < Stage::Serialization);
        assert_eq!(Stage::Correlation.name(), "correlation");
        assert_eq!(Stage::Envelope.name(), "envelope");
    }
}
