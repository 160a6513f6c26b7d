//! Context injection.

use turnstile_core::{Payload, RequestContext};
use serde_json::Value;

/// Attaches the request context to an inbound body before validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextInjectionStage;

impl ContextInjectionStage {
    /// Wraps `body` in a [`Payload`], carrying `context` when there is one.
    ///
    /// A request without a body yields no payload; a context alone is never
    /// turned into input.
    #[must_use]
    pub fn apply(body: Option<Value>, context: Option<&RequestContext>) -> Option<Payload> {
        let payload = Payload::new(body?);
        Some(match context {
            Some(ctx) => payload.with_context(ctx.clone()),
            None => payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use turnstile_core::{CorrelationId, Principal, Transport};

    fn context() -> RequestContext {
        RequestContext::new(&Principal::new(3), CorrelationId::new(), Transport::Http)
    }

    #[test]
    fn test_authenticated_body_carries_context() {
        let ctx = context();
        let payload = ContextInjectionStage::apply(Some(json!({"name": "a"})), Some(&ctx)).unwrap();

        assert!(payload.is_contextual());
        assert_eq!(payload.context().map(RequestContext::principal_id), Some(3));
        assert_eq!(payload.body(), &json!({"name": "a"}));
    }

    #[test]
    fn test_anonymous_body_passes_unchanged() {
        let payload = ContextInjectionStage::apply(Some(json!([1, 2])), None).unwrap();
        assert!(!payload.is_contextual());
        assert_eq!(payload.into_body(), json!([1, 2]));
    }

    #[test]
    fn test_no_body_no_payload() {
        assert!(ContextInjectionStage::apply(None, Some(&context())).is_none());
    }
}
