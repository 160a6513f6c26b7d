//! Event frames.
//!
//! Clients send text frames shaped `{"event": ..., "data": ..., "query": ...}`.
//! `data` is the body and `query` the query parameters of the event; both are
//! optional. Every event gets exactly one reply:
//!
//! ```json
//! {"event": "list_rooms", "data": {"data": [...], "meta": {"size": 2}}}
//! {"event": "exception", "data": {"status": 400, "error": {"property": "limit", "message": "..."}}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use turnstile_core::{ApiError, CorrelationId};
use turnstile_extract::ResponseEnvelope;
use turnstile_middleware::Inbound;
use tungstenite::Message;

/// The event name of error replies.
pub const EXCEPTION_EVENT: &str = "exception";

/// An inbound event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventFrame {
    /// The event name.
    pub event: String,
    /// The body; `null` counts as absent.
    #[serde(default)]
    pub data: Option<Value>,
    /// Query parameters.
    #[serde(default)]
    pub query: Option<Map<String, Value>>,
}

impl EventFrame {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error on property `message` when the text is
    /// not an event frame.
    pub fn parse(text: &str) -> Result<Self, ApiError> {
        serde_json::from_str(text)
            .map_err(|e| ApiError::invalid_input("message", Some(format!("malformed event frame: {e}"))))
    }

    /// Splits the frame into its event name and pipeline input.
    #[must_use]
    pub fn into_parts(self) -> (String, Inbound) {
        let inbound = Inbound::new(self.query.unwrap_or_default(), self.data);
        (self.event, inbound)
    }
}

/// The `data` member of an exception reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionData {
    /// HTTP-equivalent status code.
    pub status: u16,
    /// The error body, shaped as on HTTP.
    pub error: Value,
}

/// Builds the reply to `event`.
#[must_use]
pub fn reply(event: &str, envelope: &ResponseEnvelope) -> Message {
    let frame = json!({ "event": event, "data": envelope });
    Message::text(frame.to_string())
}

/// Builds an exception reply.
#[must_use]
pub fn exception(error: &ApiError, request_id: CorrelationId) -> Message {
    let request_id = request_id.to_string();
    let data = ExceptionData {
        status: error.status_code().as_u16(),
        error: error.to_body(Some(&request_id)),
    };
    let frame = json!({ "event": EXCEPTION_EVENT, "data": data });
    Message::text(frame.to_string())
}
