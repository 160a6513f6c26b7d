//! Authenticated principals and the authentication seam.
//!
//! Token verification is not done here. An [`Authenticator`] turns transport
//! headers into an optional [`Principal`]; `Ok(None)` means the request is
//! unauthenticated, which is not an error.

use crate::error::ApiError;
use crate::BoxFuture;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Header carrying the principal id when a trusted proxy authenticated the caller.
pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";

/// Header carrying a comma-separated list of role tags.
pub const PRINCIPAL_ROLES_HEADER: &str = "x-principal-roles";

/// An authenticated caller.
///
/// # Example
///
/// ```
/// use turnstile_core::Principal;
///
/// let principal = Principal::new(42).with_roles(["user", "admin"]);
/// assert_eq!(principal.id(), 42);
/// assert!(principal.roles().contains("admin"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: i64,
    #[serde(default)]
    roles: BTreeSet<String>,
}

impl Principal {
    /// Creates a principal with no roles.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            roles: BTreeSet::new(),
        }
    }

    /// Adds a role tag.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Adds several role tags.
    #[must_use]
    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Returns the principal id.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Returns the role tags.
    #[must_use]
    pub const fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }
}

/// Resolves the caller behind a set of transport headers.
///
/// Implementations may suspend (token introspection, session lookup). The
/// same authenticator serves HTTP requests and WebSocket handshakes.
pub trait Authenticator: Send + Sync + 'static {
    /// Authenticates the caller.
    ///
    /// Returns `Ok(None)` when no credentials are present and an error when
    /// credentials are present but rejected.
    fn authenticate<'a>(
        &'a self,
        headers: &'a HeaderMap,
    ) -> BoxFuture<'a, Result<Option<Principal>, ApiError>>;
}

/// An authenticator that never recognizes a caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Authenticator for Anonymous {
    fn authenticate<'a>(
        &'a self,
        _headers: &'a HeaderMap,
    ) -> BoxFuture<'a, Result<Option<Principal>, ApiError>> {
        Box::pin(async { Ok(None) })
    }
}

/// Trusts principal headers set by an authenticating proxy.
///
/// Reads [`PRINCIPAL_ID_HEADER`] and [`PRINCIPAL_ROLES_HEADER`]. Only deploy
/// this behind an ingress that strips these headers from client traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderAuthenticator;

impl HeaderAuthenticator {
    /// Creates a header authenticator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn resolve(headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
        let Some(raw_id) = headers.get(PRINCIPAL_ID_HEADER) else {
            return Ok(None);
        };

        let id = raw_id
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or_else(|| ApiError::unauthorized("malformed principal id"))?;

        let roles = headers
            .get(PRINCIPAL_ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(Some(Principal::new(id).with_roles(roles)))
    }
}

impl Authenticator for HeaderAuthenticator {
    fn authenticate<'a>(
        &'a self,
        headers: &'a HeaderMap,
    ) -> BoxFuture<'a, Result<Option<Principal>, ApiError>> {
        Box::pin(async move { Self::resolve(headers) })
    }
}
