//! Event gateway.
//!
//! A [`Gateway`] maps event names to operations and serves a connection:
//! each text frame is parsed, dispatched with [`HostKind::WebSocket`] and
//! answered with exactly one frame. Failures of a single message are
//! answered with an exception frame; the connection stays open.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn, Instrument};
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::Message;
use turnstile_core::{ApiError, HostKind, RequestContext};
use turnstile_middleware::{outcome, ContextFactory, Endpoint, Operation, Outgoing};
use turnstile_telemetry::metrics::record_request;

use crate::connection::WebSocket;
use crate::error::{WsError, WsResult};
use crate::message::{exception, reply, EventFrame};
use crate::session::Session;

/// Routes WebSocket events to operations.
#[derive(Clone)]
pub struct Gateway {
    events: Arc<HashMap<String, Arc<dyn Endpoint>>>,
    factory: Arc<ContextFactory>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates a gateway builder.
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Returns true if `event` is routed.
    #[must_use]
    pub fn handles(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    /// Returns the number of routed events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Handles one text frame and returns the reply.
    pub async fn handle_text(&self, session: &Session, text: &str) -> Message {
        let started = Instant::now();
        let request_id = session.request_id();

        let frame = match EventFrame::parse(text) {
            Ok(frame) => frame,
            Err(error) => {
                debug!(request_id = %request_id, error = %error, "malformed frame");
                record_request("ws", "rejected", started.elapsed());
                return exception(&error, request_id);
            }
        };

        let (event, inbound) = frame.into_parts();
        let span = tracing::debug_span!(
            "message",
            event = %event,
            request_id = %request_id,
            connection_id = %session.connection_id(),
        );

        async {
            let Some(endpoint) = self.events.get(&event) else {
                let error = ApiError::not_found(format!("no handler for event '{event}'"));
                record_request("ws", "rejected", started.elapsed());
                return exception(&error, request_id);
            };

            let context = session.context(&self.factory);
            let result = endpoint
                .invoke(HostKind::WebSocket, context.as_ref(), inbound)
                .await;

            let elapsed = context
                .as_ref()
                .map_or_else(|| started.elapsed(), RequestContext::elapsed);
            record_request("ws", outcome(&result), elapsed);

            match result {
                Ok(Outgoing::Envelope(envelope)) => reply(&event, &envelope),
                Ok(Outgoing::Binary(body)) => Message::binary(body.bytes),
                Err(error) => {
                    if error.status_code().is_server_error() {
                        warn!(operation = endpoint.name(), error = %error, "operation failed");
                    }
                    exception(&error, request_id)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Serves `ws` until the peer closes, the stream ends or the connection
    /// idles out.
    ///
    /// # Errors
    ///
    /// Returns transport failures. Ordinary closes return `Ok`.
    pub async fn serve<S>(&self, mut ws: WebSocket<S>) -> WsResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        info!(
            connection_id = %ws.connection_id(),
            request_id = %ws.session().request_id(),
            "connection opened"
        );

        let result = loop {
            let message = match ws.recv().await {
                None => break Ok(()),
                Some(Ok(message)) => message,
                Some(Err(WsError::IdleTimeout(idle))) => {
                    debug!(idle = ?idle, "closing idle connection");
                    break ws.close(CloseCode::Away, "idle timeout").await;
                }
                Some(Err(e)) if e.is_normal_close() => break Ok(()),
                Some(Err(e)) => break Err(e),
            };

            let response = match message {
                Message::Text(text) => self.handle_text(ws.session(), text.as_str()).await,
                Message::Binary(_) => {
                    let error = ApiError::invalid_input("message", Some("binary frames are not supported"));
                    exception(&error, ws.session().request_id())
                }
                Message::Close(_) => break ws.flush().await,
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };

            if let Err(e) = ws.send(response).await {
                break if e.is_normal_close() { Ok(()) } else { Err(e) };
            }
        };

        match &result {
            Ok(()) => info!(
                connection_id = %ws.connection_id(),
                duration = ?ws.session().age(),
                "connection closed"
            ),
            Err(e) => warn!(connection_id = %ws.connection_id(), error = %e, "connection failed"),
        }
        result
    }
}

/// Builder for [`Gateway`].
#[derive(Default)]
pub struct GatewayBuilder {
    events: HashMap<String, Arc<dyn Endpoint>>,
    factory: Option<ContextFactory>,
}

impl GatewayBuilder {
    /// Routes `event` to `operation`.
    #[must_use]
    pub fn event<O: Operation>(self, event: impl Into<String>, operation: O) -> Self {
        self.endpoint(event, Arc::new(operation))
    }

    /// Routes `event` to an already erased endpoint.
    #[must_use]
    pub fn endpoint(mut self, event: impl Into<String>, endpoint: Arc<dyn Endpoint>) -> Self {
        let event = event.into();
        if self.events.insert(event.clone(), endpoint).is_some() {
            warn!(event = %event, "event registered twice; keeping the last handler");
        }
        self
    }

    /// Sets the context factory shared with HTTP.
    #[must_use]
    pub fn context_factory(mut self, factory: ContextFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Builds the gateway.
    #[must_use]
    pub fn build(self) -> Gateway {
        Gateway {
            events: Arc::new(self.events),
            factory: Arc::new(self.factory.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use serde_json::{json, Value};
    use turnstile_core::{BoxFuture, CorrelationId, Principal};
    use turnstile_extract::Reply;
    use turnstile_middleware::Input;
    use turnstile_validate::{Empty, PaginationParams};

    struct WhoAmI;

    impl Operation for WhoAmI {
        type Query = Empty;
        type Body = Empty;

        fn name(&self) -> &'static str {
            "whoami"
        }

        fn call<'a>(
            &'a self,
            context: Option<&'a RequestContext>,
            _input: Input<Empty, Empty>,
        ) -> BoxFuture<'a, Result<Reply, ApiError>> {
            Box::pin(async move {
                let ctx = context.ok_or_else(|| ApiError::unauthorized("login required"))?;
                Ok(Reply::untyped(json!(ctx.request_id().to_string())))
            })
        }
    }

    struct Page;

    impl Operation for Page {
        type Query = PaginationParams;
        type Body = Empty;

        fn name(&self) -> &'static str {
            "page"
        }

        fn call<'a>(
            &'a self,
            _context: Option<&'a RequestContext>,
            input: Input<PaginationParams, Empty>,
        ) -> BoxFuture<'a, Result<Reply, ApiError>> {
            Box::pin(async move { Ok(Reply::untyped(json!(input.query.limit))) })
        }
    }

    fn gateway() -> Gateway {
        Gateway::builder().event("whoami", WhoAmI).event("page", Page).build()
    }

    fn frame(message: &Message) -> Value {
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_context_carries_session_request_id() {
        let request_id = CorrelationId::new();
        let session = Session::new(request_id, Some(Principal::new(1)), HeaderMap::new());

        for _ in 0..2 {
            let reply = gateway().handle_text(&session, r#"{"event":"whoami"}"#).await;
            assert_eq!(
                frame(&reply),
                json!({ "event": "whoami", "data": { "data": request_id.to_string(), "meta": {} } })
            );
        }
    }

    #[tokio::test]
    async fn test_errors_become_exception_frames() {
        let session = Session::new(CorrelationId::new(), None, HeaderMap::new());
        let gateway = gateway();

        let unknown = frame(&gateway.handle_text(&session, r#"{"event":"nope"}"#).await);
        assert_eq!(unknown["event"], "exception");
        assert_eq!(unknown["data"]["status"], 404);

        let anonymous = frame(&gateway.handle_text(&session, r#"{"event":"whoami"}"#).await);
        assert_eq!(anonymous["data"]["status"], 401);

        let invalid = frame(
            &gateway
                .handle_text(&session, r#"{"event":"page","query":{"limit":"500"}}"#)
                .await,
        );
        assert_eq!(
            invalid["data"],
            json!({ "status": 400, "error": { "property": "limit", "message": "limit must not be greater than 100" } })
        );

        let malformed = frame(&gateway.handle_text(&session, "{").await);
        assert_eq!(malformed["data"]["error"]["property"], "message");
    }

    #[test]
    fn test_builder() {
        let gateway = gateway();
        assert!(gateway.handles("page"));
        assert!(!gateway.handles("other"));
        assert_eq!(gateway.event_count(), 2);
    }
}
