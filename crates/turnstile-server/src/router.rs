//! Request routing.
//!
//! HTTP routes match on method and exact path. WebSocket routes match on
//! path alone and are only taken for valid upgrade requests; a plain `GET`
//! to a WebSocket path falls through to the HTTP table.
//!
//! ```rust
//! use turnstile_server::{Router, RouteMatch};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_websocket("/events", turnstile_ws::Gateway::builder().build());
//!
//! assert!(matches!(router.match_route(&Method::GET, "/events", true), Some(RouteMatch::WebSocket(_))));
//! assert!(router.match_route(&Method::GET, "/events", false).is_none());
//! ```

use std::collections::HashMap;

use http::Method;
use turnstile_middleware::HttpEndpoint;
use turnstile_ws::Gateway;

/// A matched route.
#[derive(Debug, Clone, Copy)]
pub enum RouteMatch<'a> {
    /// An operation served over HTTP.
    Http(&'a HttpEndpoint),
    /// A gateway to upgrade the connection to.
    WebSocket(&'a Gateway),
}

/// Method and path routing table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    http: HashMap<(Method, String), HttpEndpoint>,
    websocket: HashMap<String, Gateway>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an HTTP route. A later route for the same method and path
    /// replaces the earlier one.
    pub fn add_route(&mut self, method: Method, path: impl Into<String>, endpoint: HttpEndpoint) {
        let path = normalize(path.into());
        if let Some(previous) = self.http.insert((method.clone(), path.clone()), endpoint) {
            tracing::warn!(%method, %path, replaced = previous.name(), "route replaced");
        }
    }

    /// Adds a WebSocket route.
    pub fn add_websocket(&mut self, path: impl Into<String>, gateway: Gateway) {
        self.websocket.insert(normalize(path.into()), gateway);
    }

    /// Matches a request.
    ///
    /// `upgrade` tells whether the request asks for a WebSocket upgrade.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str, upgrade: bool) -> Option<RouteMatch<'_>> {
        if upgrade && method == Method::GET {
            if let Some(gateway) = self.websocket.get(path) {
                return Some(RouteMatch::WebSocket(gateway));
            }
        }
        self.http
            .get(&(method.clone(), path.to_string()))
            .map(RouteMatch::Http)
    }

    /// Returns true if any method is routed at `path`.
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.websocket.contains_key(path) || self.http.keys().any(|(_, p)| p == path)
    }

    /// Returns the number of HTTP and WebSocket routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.http.len() + self.websocket.len()
    }
}

fn normalize(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}
