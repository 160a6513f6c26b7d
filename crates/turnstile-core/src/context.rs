//! Request context types.
//!
//! The [`RequestContext`] describes the authenticated principal and the
//! transport a single request arrived on. It is built once per request by the
//! context factory and is read-only afterwards.

use crate::error::ApiError;
use crate::identity::Principal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use uuid::Uuid;

/// A transport correlation identifier, using UUID v7.
///
/// Incoming ids are accepted only if they parse as a UUID; anything else is
/// replaced by a freshly generated one.
///
/// # Example
///
/// ```
/// use turnstile_core::CorrelationId;
///
/// let id = CorrelationId::new();
/// assert_eq!(CorrelationId::parse(&id.to_string()), Some(id));
/// assert!(CorrelationId::parse("not-a-uuid").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generates a new time-ordered correlation id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a correlation id from a header value.
    ///
    /// Returns `None` when the value is not a syntactically valid UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Creates a `CorrelationId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// The transports the pipeline serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Request/response HTTP.
    Http,
    /// Persistent-connection WebSocket.
    WebSocket,
}

impl Transport {
    /// Returns the transport name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::WebSocket => "ws",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of execution host invoking the pipeline.
///
/// Hosts report what they are; only [`HostKind::Http`] and
/// [`HostKind::WebSocket`] map onto a supported [`Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// An HTTP server host.
    Http,
    /// A WebSocket gateway host.
    WebSocket,
    /// A message-broker RPC host.
    Rpc,
}

impl HostKind {
    /// Returns the host name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::WebSocket => "ws",
            Self::Rpc => "rpc",
        }
    }
}

impl From<Transport> for HostKind {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Http => Self::Http,
            Transport::WebSocket => Self::WebSocket,
        }
    }
}

impl TryFrom<HostKind> for Transport {
    type Error = ApiError;

    fn try_from(host: HostKind) -> Result<Self, Self::Error> {
        match host {
            HostKind::Http => Ok(Self::Http),
            HostKind::WebSocket => Ok(Self::WebSocket),
            HostKind::Rpc => Err(ApiError::unsupported_transport(host.as_str())),
        }
    }
}

impl FromStr for HostKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "ws" | "websocket" => Ok(Self::WebSocket),
            "rpc" => Ok(Self::Rpc),
            other => Err(ApiError::unsupported_transport(other)),
        }
    }
}

/// Immutable per-request context.
///
/// Holds the principal id, its roles, the correlation id and the transport.
/// There are no setters: a context is assembled once and then only borrowed.
///
/// # Example
///
/// ```
/// use turnstile_core::{CorrelationId, Principal, RequestContext, Transport};
///
/// let principal = Principal::new(42).with_role("admin");
/// let ctx = RequestContext::new(&principal, CorrelationId::new(), Transport::Http);
///
/// assert_eq!(ctx.principal_id(), 42);
/// assert!(ctx.has_role("admin"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    principal_id: i64,
    roles: BTreeSet<String>,
    request_id: CorrelationId,
    transport: Transport,
    started_at: Instant,
}

impl RequestContext {
    /// Creates the context for an authenticated principal.
    #[must_use]
    pub fn new(principal: &Principal, request_id: CorrelationId, transport: Transport) -> Self {
        Self {
            principal_id: principal.id(),
            roles: principal.roles().clone(),
            request_id,
            transport,
            started_at: Instant::now(),
        }
    }

    /// Returns the principal id.
    #[must_use]
    pub const fn principal_id(&self) -> i64 {
        self.principal_id
    }

    /// Returns the role tags of the principal.
    #[must_use]
    pub const fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Returns true if the principal carries the given role tag.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Returns the correlation id.
    #[must_use]
    pub const fn request_id(&self) -> CorrelationId {
        self.request_id
    }

    /// Returns the transport the request arrived on.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// Returns the elapsed time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

// The creation instant is excluded from the serialized view.
impl Serialize for RequestContext {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("RequestContext", 4)?;
        state.serialize_field("principal_id", &self.principal_id)?;
        state.serialize_field("roles", &self.roles)?;
        state.serialize_field("request_id", &self.request_id)?;
        state.serialize_field("transport", &self.transport)?;
        state.end()
    }
}
