//! WebSocket errors.

use std::time::Duration;
use thiserror::Error;

/// Result type for WebSocket operations.
pub type WsResult<T> = Result<T, WsError>;

/// Errors raised while upgrading or serving a WebSocket connection.
///
/// Per-message failures (bad frames, validation, operation errors) are not
/// `WsError`s: they are answered with an exception frame and the connection
/// stays open.
#[derive(Debug, Error)]
pub enum WsError {
    /// The HTTP request is not a valid upgrade request.
    #[error("not a WebSocket upgrade request: {reason}")]
    NotWebSocketRequest {
        /// What is missing or wrong.
        reason: String,
    },

    /// The upgraded connection could not be obtained.
    #[error("WebSocket handshake failed: {0}")]
    HandshakeFailed(String),

    /// The connection is closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Close code sent or received, if any.
        code: Option<u16>,
        /// Close reason.
        reason: String,
    },

    /// Nothing arrived within the idle timeout.
    #[error("connection idle for {0:?}")]
    IdleTimeout(Duration),

    /// A frame could not be sent.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol error from tungstenite.
    #[error("tungstenite error: {0}")]
    Tungstenite(#[from] tungstenite::Error),
}

impl WsError {
    /// Creates a not-a-WebSocket-request error.
    pub fn not_websocket(reason: impl Into<String>) -> Self {
        Self::NotWebSocketRequest {
            reason: reason.into(),
        }
    }

    /// Creates a handshake error.
    pub fn handshake_failed(reason: impl Into<String>) -> Self {
        Self::HandshakeFailed(reason.into())
    }

    /// Creates a connection-closed error.
    pub fn connection_closed(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            code,
            reason: reason.into(),
        }
    }

    /// Creates a send error.
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed(reason.into())
    }

    /// Returns the close code for connection-closed errors.
    #[must_use]
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::ConnectionClosed { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns true for the ordinary ways a connection ends.
    #[must_use]
    pub fn is_normal_close(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed { .. }
                | Self::IdleTimeout(_)
                | Self::Tungstenite(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed)
        )
    }
}
