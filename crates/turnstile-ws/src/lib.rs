//! WebSocket transport for Turnstile.
//!
//! A connection goes through the pipeline in two parts:
//!
//! - **Handshake** ([`upgrade::accept`]): RFC 6455 validation, correlation
//!   and identity. The correlation id is fixed here for the life of the
//!   connection, generated when the client sent none.
//! - **Messages** ([`Gateway::serve`]): every `{event, data, query}` frame
//!   gets a fresh request context built from the [`Session`], then runs
//!   through the same dispatch as HTTP with the WebSocket host kind.
//!
//! ```text
//! HTTP upgrade ──► accept() ──► 101 + Session
//!                                  │
//!                                  ▼
//!              complete_upgrade() ──► WebSocket ──► Gateway::serve()
//!                                                      │ per frame
//!                                                      ▼
//!                                   context ──► dispatch ──► reply / exception
//! ```
//!
//! Pings are answered by the protocol layer, close frames end the loop and
//! a connection with no traffic for the idle timeout is closed.

pub mod config;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod message;
pub mod session;
pub mod upgrade;

pub use config::WebSocketConfig;
pub use connection::WebSocket;
pub use error::{WsError, WsResult};
pub use gateway::{Gateway, GatewayBuilder};
pub use message::{EventFrame, ExceptionData, EXCEPTION_EVENT};
pub use session::{ConnectionId, Session};
pub use tungstenite::Message;
pub use upgrade::{accept, complete_upgrade, is_websocket_request, validate_upgrade_request, WebSocketUpgrade};
