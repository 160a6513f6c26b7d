//! Per-connection session state.
//!
//! A session is created once, at the handshake, and lives as long as the
//! connection. Its correlation id is resolved from the handshake headers and
//! reused for every message, so all logs and errors of one connection share
//! it.

use http::HeaderMap;
use std::time::Instant;
use turnstile_core::{CorrelationId, Principal, RequestContext, Transport};
use turnstile_middleware::ContextFactory;
use uuid::Uuid;

/// Identifies one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new time-ordered connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the handshake established about a connection.
#[derive(Debug, Clone)]
pub struct Session {
    connection_id: ConnectionId,
    request_id: CorrelationId,
    principal: Option<Principal>,
    headers: HeaderMap,
    connected_at: Instant,
}

impl Session {
    /// Creates a session from handshake results.
    ///
    /// `headers` should already carry the resolved correlation id.
    #[must_use]
    pub fn new(request_id: CorrelationId, principal: Option<Principal>, headers: HeaderMap) -> Self {
        Self {
            connection_id: ConnectionId::new(),
            request_id,
            principal,
            headers,
            connected_at: Instant::now(),
        }
    }

    /// Returns the connection id.
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Returns the correlation id shared by every message.
    #[must_use]
    pub fn request_id(&self) -> CorrelationId {
        self.request_id
    }

    /// Returns the authenticated principal.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns the handshake headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns how long the connection has been open.
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }

    /// Creates the context for one message.
    #[must_use]
    pub fn context(&self, factory: &ContextFactory) -> Option<RequestContext> {
        factory.create(self.principal(), self.request_id, Transport::WebSocket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
        let id = ConnectionId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }

    #[test]
    fn test_every_message_context_shares_the_request_id() {
        let request_id = CorrelationId::new();
        let session = Session::new(request_id, Some(Principal::new(11)), HeaderMap::new());
        let factory = ContextFactory::default();

        let first = session.context(&factory).unwrap();
        let second = session.context(&factory).unwrap();

        assert_eq!(first.request_id(), request_id);
        assert_eq!(second.request_id(), request_id);
        assert_eq!(first.transport(), Transport::WebSocket);
        assert_eq!(first.principal_id(), 11);
    }

    #[test]
    fn test_anonymous_session_has_no_context() {
        let session = Session::new(CorrelationId::new(), None, HeaderMap::new());
        assert!(session.context(&ContextFactory::default()).is_none());
    }
}
