//! Query string extractor.
//!
//! The query is decoded into a JSON object of raw strings and handed to
//! validation untyped; coercion into declared kinds happens there.

use crate::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
use serde_json::{Map, Value};
use std::ops::Deref;

/// Decoded query parameters.
///
/// Values are strings. A key that repeats becomes an array of its values in
/// order of appearance.
///
/// # Example
///
/// ```rust
/// use turnstile_extract::{ExtractionContext, FromRequest, QueryMap};
/// use http::Uri;
///
/// let ctx = ExtractionContext::builder()
///     .uri(Uri::from_static("/rooms?limit=20&id=1&id=2"))
///     .build();
///
/// let QueryMap(query) = QueryMap::from_request(&ctx).unwrap();
/// assert_eq!(query["limit"], "20");
/// assert_eq!(query["id"], serde_json::json!(["1", "2"]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap(pub Map<String, Value>);

impl QueryMap {
    /// Decodes a raw query string.
    pub fn parse(query: &str) -> Result<Self, ExtractionError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| ExtractionError::malformed(ExtractionSource::Query, e.to_string()))?;

        let mut map = Map::new();
        for (key, value) in pairs {
            match map.get_mut(&key) {
                None => {
                    map.insert(key, Value::String(value));
                }
                Some(Value::Array(values)) => values.push(Value::String(value)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
            }
        }

        Ok(Self(map))
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl Deref for QueryMap {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for QueryMap {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        Self::parse(ctx.query_string().unwrap_or(""))
    }
}
