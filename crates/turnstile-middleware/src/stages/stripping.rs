//! Context stripping.

use turnstile_core::Payload;

/// Removes the injected context once validation has passed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextStrippingStage;

impl ContextStrippingStage {
    /// Returns `payload` without its context. Payloads that never carried
    /// one pass unchanged, and stripping twice equals stripping once.
    #[must_use]
    pub fn apply<T>(payload: Payload<T>) -> Payload<T> {
        if payload.is_contextual() {
            tracing::trace!("stripping request context");
        }
        payload.without_context()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use turnstile_core::{CorrelationId, Principal, RequestContext, Transport};

    #[test]
    fn test_strips_injected_context() {
        let ctx = RequestContext::new(&Principal::new(8), CorrelationId::new(), Transport::WebSocket);
        let payload = Payload::new(json!({"a": 1})).with_context(ctx);

        let stripped = ContextStrippingStage::apply(payload);
        assert!(!stripped.is_contextual());
        assert_eq!(stripped.into_body(), json!({"a": 1}));
    }

    #[test]
    fn test_without_prior_injection() {
        let stripped = ContextStrippingStage::apply(Payload::new(5_u32));
        assert!(!stripped.is_contextual());
        assert_eq!(stripped.into_body(), 5);
    }

    proptest! {
        #[test]
        fn prop_stripping_is_idempotent(n in any::<i64>(), s in "[a-z]{0,8}", inject in any::<bool>()) {
            let mut payload = Payload::new(json!({ "n": n, "s": s }));
            if inject {
                let ctx = RequestContext::new(&Principal::new(n), CorrelationId::new(), Transport::Http);
                payload = payload.with_context(ctx);
            }

            let once = ContextStrippingStage::apply(payload);
            let body_once: Value = once.body().clone();
            let twice = ContextStrippingStage::apply(once);

            prop_assert!(!twice.is_contextual());
            prop_assert_eq!(twice.into_body(), body_once);
        }
    }
}
