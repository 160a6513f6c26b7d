//! Response serialization filter.
//!
//! Operation results carrying an exposure schema are projected onto it:
//! only exposed fields survive, everything else is dropped. Pre-built
//! envelopes and binary bodies pass through untouched.

use turnstile_extract::{BinaryBody, Reply, ResponseEnvelope};
use serde_json::Value;

/// The result of the serialization filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filtered {
    /// Projected data, still to be enveloped.
    Data(Value),
    /// A pre-built envelope.
    Envelope(ResponseEnvelope),
    /// A binary body.
    Binary(BinaryBody),
}

/// Applies exposure schemas to operation results.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializationFilter;

impl SerializationFilter {
    /// Filters a reply.
    #[must_use]
    pub fn apply(reply: Reply) -> Filtered {
        match reply {
            Reply::Data { value, exposure } => {
                tracing::trace!(schema = exposure.name(), "projecting result");
                Filtered::Data(exposure.project(&value))
            }
            Reply::Envelope(envelope) => Filtered::Envelope(envelope),
            Reply::Binary(body) => Filtered::Binary(body),
        }
    }
}
