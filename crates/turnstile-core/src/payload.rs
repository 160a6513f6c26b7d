//! The inbound payload carrier.
//!
//! A [`Payload`] pairs a body with the request context that was attached to
//! it before validation. The context rides next to the body rather than
//! inside it, so client data can never collide with it and validators read
//! it through [`Payload::context`].

use crate::context::RequestContext;

/// A request body, optionally carrying the request context.
///
/// # Example
///
/// ```
/// use turnstile_core::{CorrelationId, Payload, Principal, RequestContext, Transport};
///
/// let ctx = RequestContext::new(&Principal::new(1), CorrelationId::new(), Transport::Http);
/// let payload = Payload::new(serde_json::json!({"name": "a"})).with_context(ctx);
/// assert!(payload.is_contextual());
///
/// let stripped = payload.without_context();
/// assert!(!stripped.is_contextual());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Payload<T = serde_json::Value> {
    body: T,
    context: Option<RequestContext>,
}

impl<T> Payload<T> {
    /// Wraps a body with no context attached.
    #[must_use]
    pub const fn new(body: T) -> Self {
        Self {
            body,
            context: None,
        }
    }

    /// Attaches a request context.
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Removes any attached context. A context-free payload is returned as is.
    #[must_use]
    pub fn without_context(mut self) -> Self {
        self.context = None;
        self
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &T {
        &self.body
    }

    /// Returns the attached context, if any.
    #[must_use]
    pub const fn context(&self) -> Option<&RequestContext> {
        self.context.as_ref()
    }

    /// Returns true when a context is attached.
    #[must_use]
    pub const fn is_contextual(&self) -> bool {
        self.context.is_some()
    }

    /// Converts the body while keeping the attached context.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Payload<U> {
        Payload {
            body: f(self.body),
            context: self.context,
        }
    }

    /// Fallible [`Payload::map`].
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Payload<U>, E> {
        Ok(Payload {
            body: f(self.body)?,
            context: self.context,
        })
    }

    /// Consumes the payload, returning only the body.
    #[must_use]
    pub fn into_body(self) -> T {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CorrelationId, Principal, Transport};

    fn context() -> RequestContext {
        RequestContext::new(&Principal::new(5), CorrelationId::new(), Transport::Http)
    }

    #[test]
    fn test_new_payload_has_no_context() {
        let payload = Payload::new(1_u8);
        assert!(payload.context().is_none());
        assert_eq!(*payload.body(), 1);
    }

    #[test]
    fn test_without_context_is_idempotent() {
        let payload = Payload::new("x").with_context(context());
        let once = payload.without_context();
        let twice = once.clone().without_context();
        assert_eq!(once, twice);
        assert!(!twice.is_contextual());
    }

    #[test]
    fn test_map_keeps_context() {
        let ctx = context();
        let payload = Payload::new(2_i32).with_context(ctx.clone()).map(|n| n * 10);
        assert_eq!(*payload.body(), 20);
        assert_eq!(payload.context(), Some(&ctx));
    }

    #[test]
    fn test_try_map_propagates_error() {
        let result: Result<Payload<i32>, &str> = Payload::new("nan").try_map(|_| Err("bad"));
        assert_eq!(result.unwrap_err(), "bad");
    }
}
