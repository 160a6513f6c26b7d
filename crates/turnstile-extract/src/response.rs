//! Operation results and the response envelope.
//!
//! | Result | Filtered | Enveloped |
//! |--------|----------|-----------|
//! | [`Reply::Data`] | yes | yes |
//! | [`Reply::Envelope`] | no | already |
//! | [`Reply::Binary`] | no | no |

use crate::exposure::{Exposed, ExposureSchema};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use turnstile_core::ApiError;

/// Envelope metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Number of items when `data` is a sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

/// The single response shape for non-pass-through results.
///
/// ```rust
/// use turnstile_extract::ResponseEnvelope;
/// use serde_json::json;
///
/// let list = ResponseEnvelope::wrap(json!([1, 2, 3]));
/// assert_eq!(serde_json::to_value(&list).unwrap(), json!({ "data": [1, 2, 3], "meta": { "size": 3 } }));
///
/// let single = ResponseEnvelope::wrap(json!({ "id": 1 }));
/// assert_eq!(serde_json::to_value(&single).unwrap(), json!({ "data": { "id": 1 }, "meta": {} }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// The filtered payload.
    pub data: Value,
    /// Metadata about `data`.
    #[serde(default)]
    pub meta: Meta,
}

impl ResponseEnvelope {
    /// Wraps `data`, recording its length when it is a sequence.
    #[must_use]
    pub fn wrap(data: Value) -> Self {
        let size = data.as_array().map(Vec::len);
        Self {
            data,
            meta: Meta { size },
        }
    }

    /// Returns true if `data` is a sequence.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.meta.size.is_some()
    }
}

/// A binary or streamed body delivered verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBody {
    /// Media type sent with the body.
    pub content_type: String,
    /// Raw bytes.
    pub bytes: Bytes,
}

impl BinaryBody {
    /// Creates a binary body.
    #[must_use]
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// What an operation returns.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A value still to be filtered and enveloped.
    Data {
        /// The serialized result.
        value: Value,
        /// Allow-list applied to objects in `value`.
        exposure: &'static ExposureSchema,
    },
    /// A pre-built envelope, passed through.
    Envelope(ResponseEnvelope),
    /// A binary body, passed through.
    Binary(BinaryBody),
}

impl Reply {
    /// A single exposed value.
    pub fn data<T: Exposed>(value: &T) -> Result<Self, ApiError> {
        Ok(Self::Data {
            value: to_value(value)?,
            exposure: T::exposure(),
        })
    }

    /// A sequence of exposed values.
    pub fn list<T: Exposed>(items: &[T]) -> Result<Self, ApiError> {
        Ok(Self::Data {
            value: to_value(items)?,
            exposure: T::exposure(),
        })
    }

    /// A value with no declared type. Scalars pass; objects are emptied.
    #[must_use]
    pub fn untyped(value: Value) -> Self {
        Self::Data {
            value,
            exposure: &ExposureSchema::NONE,
        }
    }

    /// A binary body.
    #[must_use]
    pub fn binary(content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::Binary(BinaryBody::new(content_type, bytes))
    }

    /// Returns true for results delivered without filtering or wrapping.
    #[must_use]
    pub const fn is_pass_through(&self) -> bool {
        matches!(self, Self::Envelope(_) | Self::Binary(_))
    }
}

impl From<ResponseEnvelope> for Reply {
    fn from(envelope: ResponseEnvelope) -> Self {
        Self::Envelope(envelope)
    }
}

impl From<BinaryBody> for Reply {
    fn from(body: BinaryBody) -> Self {
        Self::Binary(body)
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal_with_source("failed to serialize reply", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::ExposedField;
    use serde_json::json;

    #[derive(Serialize)]
    struct Room {
        id: i64,
        code: String,
    }

    static ROOM: ExposureSchema = ExposureSchema::new("Room", &[ExposedField::plain("id")]);

    impl Exposed for Room {
        fn exposure() -> &'static ExposureSchema {
            &ROOM
        }
    }

    #[test]
    fn test_data_carries_type_schema() {
        let reply = Reply::data(&Room { id: 1, code: "x".into() }).unwrap();
        match reply {
            Reply::Data { value, exposure } => {
                assert_eq!(value, json!({ "id": 1, "code": "x" }));
                assert_eq!(exposure.name(), "Room");
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_list_serializes_sequence() {
        let rooms = [Room { id: 1, code: "a".into() }, Room { id: 2, code: "b".into() }];
        let Reply::Data { value, .. } = Reply::list(&rooms).unwrap() else {
            panic!("expected data");
        };
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_pass_through_kinds() {
        assert!(Reply::binary("image/png", vec![1_u8, 2]).is_pass_through());
        assert!(Reply::from(ResponseEnvelope::wrap(json!(1))).is_pass_through());
        assert!(!Reply::untyped(json!(1)).is_pass_through());
    }

    #[test]
    fn test_envelope_round_trips_without_size() {
        let envelope: ResponseEnvelope = serde_json::from_value(json!({ "data": 5 })).unwrap();
        assert_eq!(envelope.meta, Meta::default());
        assert!(!envelope.is_sequence());
    }
}
