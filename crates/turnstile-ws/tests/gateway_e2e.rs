//! End-to-end WebSocket tests over an in-memory duplex stream.

use futures_util::{SinkExt, StreamExt};
use http::{header, Request};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::DuplexStream;
use tokio_tungstenite::WebSocketStream;
use tungstenite::protocol::Role;
use turnstile_core::{ApiError, BoxFuture, HeaderAuthenticator, RequestContext, PRINCIPAL_ID_HEADER};
use turnstile_extract::{Exposed, ExposedField, ExposureSchema, Reply};
use turnstile_middleware::{ContextFactory, Input, Operation};
use turnstile_validate::{Empty, PaginationParams};
use turnstile_ws::{accept, complete_upgrade, Gateway, Message, WebSocketConfig};

#[derive(serde::Serialize)]
struct Seat {
    id: u32,
    holder: &'static str,
}

static SEAT: ExposureSchema = ExposureSchema::new("Seat", &[ExposedField::plain("id")]);

impl Exposed for Seat {
    fn exposure() -> &'static ExposureSchema {
        &SEAT
    }
}

struct ListSeats;

impl Operation for ListSeats {
    type Query = PaginationParams;
    type Body = Empty;

    fn name(&self) -> &'static str {
        "list_seats"
    }

    fn call<'a>(
        &'a self,
        context: Option<&'a RequestContext>,
        input: Input<PaginationParams, Empty>,
    ) -> BoxFuture<'a, Result<Reply, ApiError>> {
        Box::pin(async move {
            context.ok_or_else(|| ApiError::unauthorized("login required"))?;
            let seats: Vec<Seat> = (0..input.query.limit.min(3))
                .map(|id| Seat { id, holder: "someone" })
                .collect();
            Reply::list(&seats)
        })
    }
}

struct Connected {
    client: WebSocketStream<DuplexStream>,
    request_id: String,
    server: tokio::task::JoinHandle<turnstile_ws::WsResult<()>>,
}

async fn connect(extra_headers: &[(&str, &str)], config: WebSocketConfig) -> Connected {
    let mut builder = Request::builder()
        .uri("/ws")
        .header(header::CONNECTION, "Upgrade")
        .header(header::UPGRADE, "websocket")
        .header("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ==")
        .header("Sec-WebSocket-Version", "13");
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }
    let mut request = builder.body(()).unwrap();

    let factory = ContextFactory::default();
    let upgrade = accept(&mut request, &factory, &HeaderAuthenticator, &[])
        .await
        .unwrap();
    let request_id = upgrade.response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_string();

    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    let gateway = Gateway::builder()
        .event("list_seats", ListSeats)
        .context_factory(factory)
        .build();
    let server = tokio::spawn(async move {
        let ws = complete_upgrade(server_io, config, upgrade.session).await;
        gateway.serve(ws).await
    });
    let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;

    Connected {
        client,
        request_id,
        server,
    }
}

async fn next_json(client: &mut WebSocketStream<DuplexStream>) -> Value {
    loop {
        match client.next().await.unwrap().unwrap() {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Pong(_) | Message::Ping(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_message_without_handshake_correlation_header_is_processed() {
    let mut conn = connect(&[(PRINCIPAL_ID_HEADER, "5")], WebSocketConfig::default()).await;
    assert!(turnstile_core::CorrelationId::parse(&conn.request_id).is_some());

    conn.client
        .send(Message::text(r#"{"event":"list_seats","query":{"limit":"2"}}"#))
        .await
        .unwrap();

    assert_eq!(
        next_json(&mut conn.client).await,
        json!({
            "event": "list_seats",
            "data": { "data": [{ "id": 0 }, { "id": 1 }], "meta": { "size": 2 } },
        })
    );

    conn.client.close(None).await.unwrap();
    assert!(conn.server.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_conflict_is_an_exception_and_connection_survives() {
    let mut conn = connect(&[(PRINCIPAL_ID_HEADER, "5")], WebSocketConfig::default()).await;

    conn.client
        .send(Message::text(
            r#"{"event":"list_seats","query":{"limit":"20","offset":"5","cursor":"3"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(
        next_json(&mut conn.client).await,
        json!({
            "event": "exception",
            "data": {
                "status": 400,
                "error": { "property": "cursor", "message": "offset and cursor cannot be used together" },
            },
        })
    );

    conn.client
        .send(Message::text(r#"{"event":"list_seats"}"#))
        .await
        .unwrap();
    let reply = next_json(&mut conn.client).await;
    assert_eq!(reply["data"]["meta"]["size"], 3);
}

#[tokio::test]
async fn test_anonymous_connection_gets_request_id_in_errors() {
    let mut conn = connect(&[], WebSocketConfig::default()).await;

    conn.client
        .send(Message::text(r#"{"event":"list_seats"}"#))
        .await
        .unwrap();
    let reply = next_json(&mut conn.client).await;

    assert_eq!(reply["data"]["status"], 401);
    assert_eq!(reply["data"]["error"]["request_id"], conn.request_id);
}

#[tokio::test]
async fn test_ping_is_answered() {
    let mut conn = connect(&[], WebSocketConfig::default()).await;

    conn.client.send(Message::Ping(vec![1, 2].into())).await.unwrap();
    conn.client
        .send(Message::text(r#"{"event":"missing"}"#))
        .await
        .unwrap();

    let mut saw_pong = false;
    loop {
        match conn.client.next().await.unwrap().unwrap() {
            Message::Pong(payload) => {
                assert_eq!(&payload[..], &[1, 2]);
                saw_pong = true;
            }
            Message::Text(text) => {
                let reply: Value = serde_json::from_str(text.as_str()).unwrap();
                assert_eq!(reply["data"]["status"], 404);
                break;
            }
            other => panic!("unexpected frame {other:?}"),
        }
    }
    assert!(saw_pong);
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let config = WebSocketConfig::new().idle_timeout(Some(std::time::Duration::from_millis(30)));
    let mut conn = connect(&[], config).await;

    let frame = conn.client.next().await.unwrap().unwrap();
    assert!(matches!(frame, Message::Close(Some(ref f)) if f.reason.as_str() == "idle timeout"));
    assert!(conn.server.await.unwrap().is_ok());
}

#[test]
fn test_gateway_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Gateway>();
    let _shared = Arc::new(Gateway::builder().build());
}
