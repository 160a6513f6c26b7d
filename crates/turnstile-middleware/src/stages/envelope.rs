//! Response envelope.
//!
//! Every data result leaves the pipeline as `{data, meta}`, with
//! `meta.size` set for sequences. Pre-built envelopes and binary bodies are
//! forwarded as they are. Only HTTP and WebSocket hosts are served.

use super::serialization::Filtered;
use turnstile_core::{ApiError, HostKind, Transport};
use turnstile_extract::{BinaryBody, ResponseEnvelope};
use turnstile_telemetry::metrics::record_envelope;

/// What a transport sends back.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// A JSON envelope.
    Envelope(ResponseEnvelope),
    /// A raw body.
    Binary(BinaryBody),
}

/// Wraps filtered results in the response envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEnvelopeStage;

impl ResponseEnvelopeStage {
    /// Envelopes `filtered` for `host`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnsupportedTransport`] for hosts other than HTTP
    /// and WebSocket, whatever the result.
    pub fn apply(host: HostKind, filtered: Filtered) -> Result<Outgoing, ApiError> {
        if let Err(error) = Transport::try_from(host) {
            tracing::error!(host = host.as_str(), "no envelope for host");
            return Err(error);
        }

        let (kind, outgoing) = match filtered {
            Filtered::Data(data) => ("data", Outgoing::Envelope(ResponseEnvelope::wrap(data))),
            Filtered::Envelope(envelope) => ("envelope", Outgoing::Envelope(envelope)),
            Filtered::Binary(body) => ("binary", Outgoing::Binary(body)),
        };
        record_envelope(kind);
        Ok(outgoing)
    }
}
