//! JSON body extractor.

use crate::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
use serde_json::Value;

/// Default maximum body size for JSON extraction (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

const JSON: &str = "application/json";

/// An optional, untyped JSON request body.
///
/// An empty body yields `None`; the pipeline never invents one. A body with
/// a non-JSON content type is rejected. A missing content type is accepted.
///
/// # Example
///
/// ```rust
/// use turnstile_extract::{ExtractionContext, FromRequest, JsonBody};
/// use http::Method;
///
/// let ctx = ExtractionContext::builder()
///     .method(Method::POST)
///     .header("content-type", "application/json")
///     .body(r#"{"name":"lobby"}"#)
///     .build();
///
/// let JsonBody(body) = JsonBody::from_request(&ctx).unwrap();
/// assert_eq!(body.unwrap()["name"], "lobby");
///
/// let empty = ExtractionContext::builder().method(Method::POST).build();
/// assert!(JsonBody::from_request(&empty).unwrap().0.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonBody(pub Option<Value>);

impl JsonBody {
    /// Extracts the body, rejecting anything over `max_size` bytes.
    pub fn with_limit(ctx: &ExtractionContext, max_size: usize) -> Result<Self, ExtractionError> {
        let body = ctx.body();

        if body.len() > max_size {
            return Err(ExtractionError::payload_too_large(max_size, body.len()));
        }

        if body.is_empty() {
            return Ok(Self(None));
        }

        if let Some(content_type) = ctx.content_type() {
            if !is_json(content_type) {
                return Err(ExtractionError::unsupported_media_type(JSON, content_type));
            }
        }

        serde_json::from_slice(body)
            .map(|value| Self(Some(value)))
            .map_err(|e| ExtractionError::malformed(ExtractionSource::Body, e.to_string()))
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_inner(self) -> Option<Value> {
        self.0
    }
}

impl FromRequest for JsonBody {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        Self::with_limit(ctx, DEFAULT_MAX_BODY_SIZE)
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == JSON || essence.ends_with("+json")
}
