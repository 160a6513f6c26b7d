//! An upgraded WebSocket connection.

use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, instrument, trace};
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::protocol::CloseFrame;
use tungstenite::Message;

use crate::config::WebSocketConfig;
use crate::error::{WsError, WsResult};
use crate::session::{ConnectionId, Session};

/// A WebSocket connection and the session established at its handshake.
///
/// Pings are answered by the protocol layer; [`recv`](Self::recv) still
/// reports them so callers can observe liveness.
pub struct WebSocket<S> {
    stream: WebSocketStream<S>,
    session: Session,
    config: WebSocketConfig,
    last_activity: Instant,
    closed: bool,
}

impl<S> WebSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an upgraded stream.
    pub fn new(stream: WebSocketStream<S>, config: WebSocketConfig, session: Session) -> Self {
        Self {
            stream,
            session,
            config,
            last_activity: Instant::now(),
            closed: false,
        }
    }

    /// Returns the connection id.
    pub fn connection_id(&self) -> ConnectionId {
        self.session.connection_id()
    }

    /// Returns the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the connection limits.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Returns true once a close frame was sent or received.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns how long since the last frame arrived.
    pub fn idle_duration(&self) -> std::time::Duration {
        self.last_activity.elapsed()
    }

    /// Receives the next frame.
    ///
    /// Returns `None` once the stream has ended and
    /// [`WsError::IdleTimeout`] when no frame arrived in time.
    #[instrument(level = "trace", skip(self), fields(connection_id = %self.connection_id()))]
    pub async fn recv(&mut self) -> Option<WsResult<Message>> {
        if self.closed {
            return None;
        }

        let next = match self.config.idle_timeout {
            Some(idle) => match tokio::time::timeout(idle, self.stream.next()).await {
                Ok(next) => next,
                Err(_) => return Some(Err(WsError::IdleTimeout(idle))),
            },
            None => self.stream.next().await,
        };

        match next {
            Some(Ok(message)) => {
                self.last_activity = Instant::now();
                match &message {
                    Message::Ping(_) => trace!("ping"),
                    Message::Close(frame) => {
                        debug!(frame = ?frame, "peer closed connection");
                        self.closed = true;
                    }
                    _ => {}
                }
                Some(Ok(message))
            }
            Some(Err(e)) => {
                self.closed = true;
                Some(Err(WsError::from(e)))
            }
            None => {
                self.closed = true;
                None
            }
        }
    }

    /// Sends a frame.
    pub async fn send(&mut self, message: Message) -> WsResult<()> {
        if self.closed {
            return Err(WsError::connection_closed(
                Some(u16::from(CloseCode::Normal)),
                "connection already closed",
            ));
        }
        self.stream
            .send(message)
            .await
            .map_err(|e| WsError::send_failed(e.to_string()))
    }

    /// Sends a close frame. Closing twice is a no-op.
    pub async fn close(&mut self, code: CloseCode, reason: &str) -> WsResult<()> {
        if self.closed {
            return Ok(());
        }
        debug!(connection_id = %self.connection_id(), code = u16::from(code), reason, "closing connection");
        let frame = CloseFrame {
            code,
            reason: reason.to_string().into(),
        };
        self.send(Message::Close(Some(frame))).await?;
        self.closed = true;
        Ok(())
    }

    /// Flushes frames queued by the protocol layer, such as the reply to a
    /// peer's close frame.
    pub async fn flush(&mut self) -> WsResult<()> {
        match self.stream.flush().await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(WsError::from(e)),
        }
    }
}
