//! The WebSocket upgrade handshake.
//!
//! [`accept`] validates an RFC 6455 upgrade request, runs the correlation
//! and identity stages once for the connection, and prepares the `101`
//! response. The correlation id it settles on is written back into the
//! request headers and echoed on the `101`, so a client that sent none
//! learns the id its messages will be logged under.

use base64::Engine;
use bytes::Bytes;
use http::{header, HeaderValue, Request, StatusCode};
use http_body_util::Full;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, instrument};
use tungstenite::protocol::Role;
use turnstile_core::{Authenticator, CorrelationId};
use turnstile_middleware::{ContextFactory, Response, ResponseExt};

use crate::config::WebSocketConfig;
use crate::connection::WebSocket;
use crate::error::{WsError, WsResult};
use crate::session::Session;

/// The GUID appended to the client key (RFC 6455, section 1.3).
const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

const SEC_WEBSOCKET_KEY: &str = "sec-websocket-key";
const SEC_WEBSOCKET_VERSION: &str = "sec-websocket-version";
const SEC_WEBSOCKET_PROTOCOL: &str = "sec-websocket-protocol";
const SEC_WEBSOCKET_ACCEPT: &str = "sec-websocket-accept";

/// Returns true if `request` is a well-formed upgrade request.
pub fn is_websocket_request<B>(request: &Request<B>) -> bool {
    validate_upgrade_request(request).is_ok()
}

fn header_str<'a, B>(request: &'a Request<B>, name: impl header::AsHeaderName) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Validates an upgrade request, returning the `Sec-WebSocket-Accept` value.
#[instrument(level = "debug", skip(request))]
pub fn validate_upgrade_request<B>(request: &Request<B>) -> WsResult<String> {
    let connection_upgrade = header_str(request, header::CONNECTION)
        .is_some_and(|v| v.split(',').any(|token| token.trim().eq_ignore_ascii_case("upgrade")));
    if !connection_upgrade {
        return Err(WsError::not_websocket("missing Connection: Upgrade header"));
    }

    let upgrade_websocket =
        header_str(request, header::UPGRADE).is_some_and(|v| v.eq_ignore_ascii_case("websocket"));
    if !upgrade_websocket {
        return Err(WsError::not_websocket("missing Upgrade: websocket header"));
    }

    let key = header_str(request, SEC_WEBSOCKET_KEY)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| WsError::not_websocket("missing Sec-WebSocket-Key header"))?;

    if header_str(request, SEC_WEBSOCKET_VERSION) != Some("13") {
        return Err(WsError::not_websocket(
            "missing or invalid Sec-WebSocket-Version header (must be 13)",
        ));
    }

    Ok(compute_accept_key(key))
}

/// Returns the subprotocols the client offered, in order.
pub fn requested_protocols<B>(request: &Request<B>) -> Vec<String> {
    request
        .headers()
        .get_all(SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(',').map(str::trim))
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// An accepted upgrade.
#[derive(Debug)]
pub struct WebSocketUpgrade {
    /// The `101 Switching Protocols` response.
    pub response: Response,
    /// The selected subprotocol.
    pub protocol: Option<String>,
    /// The session for the connection.
    pub session: Session,
}

fn echo_correlation(response: &mut Response, factory: &ContextFactory, request_id: CorrelationId) {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(factory.header().clone(), value);
    }
}

/// Runs the handshake for `request`.
///
/// On failure the returned response is what the client gets instead of the
/// upgrade: `400` for malformed upgrade requests, the authenticator's error
/// for rejected credentials.
#[instrument(skip_all, fields(path = request.uri().path()))]
pub async fn accept<B>(
    request: &mut Request<B>,
    factory: &ContextFactory,
    authenticator: &dyn Authenticator,
    allowed_protocols: &[&str],
) -> Result<WebSocketUpgrade, Response> {
    let accept_key = validate_upgrade_request(request).map_err(|e| {
        debug!(error = %e, "upgrade rejected");
        Response::bytes(StatusCode::BAD_REQUEST, "text/plain", Bytes::from(e.to_string()))
    })?;

    let request_id = factory.correlate(request.headers_mut());

    let principal = authenticator
        .authenticate(request.headers())
        .await
        .map_err(|e| {
            info!(request_id = %request_id, error = %e, "handshake authentication rejected");
            let mut response = Response::api_error(&e, Some(request_id));
            echo_correlation(&mut response, factory, request_id);
            response
        })?;

    let protocol = requested_protocols(request)
        .into_iter()
        .find(|p| allowed_protocols.iter().any(|a| a.eq_ignore_ascii_case(p)));

    let mut response = switching_protocols(&accept_key, protocol.as_deref());
    echo_correlation(&mut response, factory, request_id);

    let session = Session::new(request_id, principal, request.headers().clone());
    debug!(
        request_id = %request_id,
        connection_id = %session.connection_id(),
        authenticated = session.principal().is_some(),
        "upgrade accepted"
    );

    Ok(WebSocketUpgrade {
        response,
        protocol,
        session,
    })
}

fn switching_protocols(accept_key: &str, protocol: Option<&str>) -> Response {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;

    let headers = response.headers_mut();
    headers.insert(header::CONNECTION, HeaderValue::from_static("Upgrade"));
    headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
    if let Ok(value) = HeaderValue::from_str(accept_key) {
        headers.insert(SEC_WEBSOCKET_ACCEPT, value);
    }
    if let Some(value) = protocol.and_then(|p| HeaderValue::from_str(p).ok()) {
        headers.insert(SEC_WEBSOCKET_PROTOCOL, value);
    }
    response
}

/// Wraps the upgraded IO in a [`WebSocket`].
///
/// Call this with the stream obtained after the `101` was sent.
#[instrument(skip_all, fields(connection_id = %session.connection_id()))]
pub async fn complete_upgrade<S>(stream: S, config: WebSocketConfig, session: Session) -> WebSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let stream = WebSocketStream::from_raw_socket(stream, Role::Server, Some(config.protocol_config())).await;
    WebSocket::new(stream, config, session)
}
