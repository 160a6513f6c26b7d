//! # Turnstile Middleware
//!
//! The request pipeline shared by HTTP and WebSocket.
//!
//! ```text
//! HTTP:      Correlation -> Identity -> Context -+
//!                                                |
//! WebSocket: handshake (1, 2) + per message (3) -+-> dispatch
//!
//! dispatch:  Injection -> Validation -> Stripping -> operation -> Serialization -> Envelope
//! ```
//!
//! Operations implement [`Operation`]: they declare their query and body
//! types, receive validated input with the [`RequestContext`] removed, and
//! get the context as a separate argument. Their [`Reply`] is projected onto
//! its exposure schema and wrapped as `{data, meta}`.
//!
//! ## Example
//!
//! ```
//! use turnstile_middleware::pipeline::Stage;
//!
//! assert!(Stage::Validation < Stage::Stripping);
//! assert_eq!(Stage::Serialization.name(), "serialization");
//! ```
//!
//! [`RequestContext`]: turnstile_core::RequestContext
//! [`Reply`]: turnstile_extract::Reply

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod dispatch;
pub mod endpoint;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use dispatch::{dispatch, outcome, Endpoint, Inbound, Input, Operation};
pub use endpoint::HttpEndpoint;
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use stages::{ContextFactory, Filtered, Outgoing};
pub use types::{Request, Response, ResponseExt};
