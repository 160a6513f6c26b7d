//! Input validation.
//!
//! Queries are validated on their own; bodies are validated as payloads so
//! object rules can consult the injected context. Either way a rejection is
//! a single [`ApiError`] chosen by the validation normalizer.

use serde_json::{Map, Value};
use turnstile_core::{ApiError, Payload, RequestContext};
use turnstile_telemetry::metrics::record_validation_failure;
use turnstile_validate::{validate, validate_payload, Validate};

/// Binds transport input to an operation's declared types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationStage;

impl ValidationStage {
    /// Validates query parameters into `Q`.
    pub fn query<Q: Validate>(
        query: Map<String, Value>,
        context: Option<&RequestContext>,
    ) -> Result<Q, ApiError> {
        validate::<Q>(&Value::Object(query), context).map_err(|e| rejected("query", e))
    }

    /// Validates a body payload into `B`, keeping any attached context.
    ///
    /// A missing body is validated as `null`, so required fields still fail.
    pub fn body<B: Validate>(payload: Option<Payload>) -> Result<Payload<B>, ApiError> {
        let payload = payload.unwrap_or_else(|| Payload::new(Value::Null));
        validate_payload::<B>(payload).map_err(|e| rejected("body", e))
    }
}

fn rejected(source: &'static str, error: ApiError) -> ApiError {
    record_validation_failure(error.error_code());
    tracing::debug!(source, error = %error, "input rejected");
    error
}
