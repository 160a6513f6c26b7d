//! Middleware context.
//!
//! The [`MiddlewareContext`] is the mutable state the HTTP middleware chain
//! fills in: the correlation id, then the principal, then the immutable
//! [`RequestContext`] built from both.

use std::time::Instant;
use turnstile_core::{CorrelationId, Principal, RequestContext};

/// State that flows through the middleware chain.
///
/// # Example
///
/// ```
/// use turnstile_middleware::context::MiddlewareContext;
/// use turnstile_core::Principal;
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_principal(Principal::new(7).with_role("admin"));
///
/// assert_eq!(ctx.principal().map(Principal::id), Some(7));
/// assert!(ctx.request_context().is_none());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    correlation_id: CorrelationId,
    principal: Option<Principal>,
    request_context: Option<RequestContext>,
    started_at: Instant,
}

impl MiddlewareContext {
    /// Creates a context with a fresh correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            principal: None,
            request_context: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the correlation id.
    #[must_use]
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Sets the correlation id. Only the correlation stage calls this.
    pub fn set_correlation_id(&mut self, id: CorrelationId) {
        self.correlation_id = id;
    }

    /// Returns the authenticated principal.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Sets the principal. Only the identity stage calls this.
    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    /// Returns the request context, present for authenticated requests.
    #[must_use]
    pub fn request_context(&self) -> Option<&RequestContext> {
        self.request_context.as_ref()
    }

    /// Sets the request context. Only the context stage calls this.
    pub fn set_request_context(&mut self, context: RequestContext) {
        self.request_context = Some(context);
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_core::Transport;

    #[test]
    fn test_new_context_is_anonymous() {
        let ctx = MiddlewareContext::new();
        assert!(ctx.principal().is_none());
        assert!(ctx.request_context().is_none());
    }

    #[test]
    fn test_set_request_context() {
        let mut ctx = MiddlewareContext::new();
        let principal = Principal::new(3);
        let request_context = RequestContext::new(&principal, ctx.correlation_id(), Transport::Http);
        ctx.set_principal(principal);
        ctx.set_request_context(request_context);

        let stored = ctx.request_context().unwrap();
        assert_eq!(stored.principal_id(), 3);
        assert_eq!(stored.request_id(), ctx.correlation_id());
    }
}
