//! # Turnstile Server
//!
//! Hosts turnstile operations over HTTP/1.1 and WebSocket on one listener.
//!
//! - exact method and path routing to [`HttpEndpoint`](turnstile_middleware::HttpEndpoint)s
//! - WebSocket upgrade routes served by [`Gateway`](turnstile_ws::Gateway)s
//! - built-in `/health` and optional `/metrics`
//! - per-request timeout and body limit
//! - graceful shutdown
//!
//! ```rust,no_run
//! use http::Method;
//! use turnstile_core::HeaderAuthenticator;
//! use turnstile_server::Server;
//! use turnstile_ws::Gateway;
//! # use turnstile_core::{ApiError, BoxFuture, RequestContext};
//! # use turnstile_extract::Reply;
//! # use turnstile_middleware::{Input, Operation};
//! # use turnstile_validate::Empty;
//! # struct ListRooms;
//! # impl Operation for ListRooms {
//! #     type Query = Empty;
//! #     type Body = Empty;
//! #     fn name(&self) -> &'static str { "list_rooms" }
//! #     fn call<'a>(&'a self, _: Option<&'a RequestContext>, _: Input<Empty, Empty>)
//! #         -> BoxFuture<'a, Result<Reply, ApiError>> {
//! #         Box::pin(async { Ok(Reply::untyped(serde_json::json!([]))) })
//! #     }
//! # }
//!
//! # async fn run() -> Result<(), turnstile_server::ServerError> {
//! Server::builder()
//!     .http_addr("0.0.0.0:8080")
//!     .authenticator(HeaderAuthenticator::new())
//!     .route(Method::GET, "/rooms", ListRooms)
//!     .websocket("/live", Gateway::builder().event("list_rooms", ListRooms))
//!     .build()
//!     .run()
//!     .await
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod health;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{ServerError, ServerResult};
pub use health::{HealthCheck, HealthStatus, HEALTH_PATH};
pub use router::{RouteMatch, Router};
pub use server::{Server, ServerBuilder, METRICS_PATH};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
