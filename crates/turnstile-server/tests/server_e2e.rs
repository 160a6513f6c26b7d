//! Server tests over real TCP connections.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use turnstile_core::{ApiError, BoxFuture, HeaderAuthenticator, RequestContext, PRINCIPAL_ID_HEADER};
use turnstile_extract::{Exposed, ExposedField, ExposureSchema, Reply};
use turnstile_middleware::{Input, Operation};
use turnstile_server::{Server, ServerResult, ShutdownSignal};
use turnstile_validate::{Empty, PaginationParams};
use turnstile_ws::Gateway;

#[derive(serde::Serialize)]
struct Room {
    id: u32,
    door_code: &'static str,
}

static ROOM: ExposureSchema = ExposureSchema::new("Room", &[ExposedField::plain("id")]);

impl Exposed for Room {
    fn exposure() -> &'static ExposureSchema {
        &ROOM
    }
}

struct ListRooms;

impl Operation for ListRooms {
    type Query = PaginationParams;
    type Body = Empty;

    fn name(&self) -> &'static str {
        "list_rooms"
    }

    fn call<'a>(
        &'a self,
        _context: Option<&'a RequestContext>,
        input: Input<PaginationParams, Empty>,
    ) -> BoxFuture<'a, Result<Reply, ApiError>> {
        Box::pin(async move {
            let rooms: Vec<Room> = (0..input.query.limit.min(4))
                .map(|id| Room { id, door_code: "1234" })
                .collect();
            Reply::list(&rooms)
        })
    }
}

struct Running {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    handle: JoinHandle<ServerResult<()>>,
}

async fn start() -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = Server::builder()
        .shutdown_timeout(Duration::from_millis(500))
        .authenticator(HeaderAuthenticator::new())
        .route(Method::GET, "/rooms", ListRooms)
        .websocket("/live", Gateway::builder().event("list_rooms", ListRooms))
        .build();

    let shutdown = ShutdownSignal::new();
    let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

    Running {
        addr,
        shutdown,
        handle,
    }
}

async fn http_get(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> (StatusCode, http::HeaderMap, Value) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(connection);

    let mut request = http::Request::get(path).header(http::header::HOST, addr.to_string());
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = sender
        .send_request(request.body(Full::new(Bytes::new())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, serde_json::from_slice(&bytes).unwrap())
}

async fn stop(running: Running) {
    running.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .expect("server should stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_http_route_filters_and_envelopes() {
    let running = start().await;

    let (status, headers, body) = http_get(running.addr, "/rooms?limit=2", &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(
        body,
        json!({ "data": [{ "id": 0 }, { "id": 1 }], "meta": { "size": 2 } })
    );

    stop(running).await;
}

#[tokio::test]
async fn test_http_cursor_conflict_over_tcp() {
    let running = start().await;

    let (status, _, body) = http_get(running.addr, "/rooms?offset=1&cursor=2", &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["property"], "cursor");

    stop(running).await;
}

#[tokio::test]
async fn test_health_over_tcp() {
    let running = start().await;

    let (status, _, body) = http_get(running.addr, "/health", &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    stop(running).await;
}

#[tokio::test]
async fn test_websocket_upgrade_and_event() {
    let running = start().await;

    let url = format!("ws://{}/live", running.addr);
    let mut request = url.into_client_request().unwrap();
    request
        .headers_mut()
        .insert(PRINCIPAL_ID_HEADER, http::HeaderValue::from_static("9"));

    let stream = TcpStream::connect(running.addr).await.unwrap();
    let (mut client, response) = tokio_tungstenite::client_async(request, stream).await.unwrap();

    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
    assert!(response.headers().contains_key("x-request-id"));

    client
        .send(Message::text(r#"{"event":"list_rooms","query":{"limit":"3"}}"#))
        .await
        .unwrap();

    let reply = loop {
        match client.next().await.unwrap().unwrap() {
            Message::Text(text) => break serde_json::from_str::<Value>(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    };
    assert_eq!(reply["event"], "list_rooms");
    assert_eq!(reply["data"]["meta"]["size"], 3);
    assert_eq!(reply["data"]["data"][2], json!({ "id": 2 }));

    client.close(None).await.unwrap();
    stop(running).await;
}

#[tokio::test]
async fn test_shutdown_with_open_websocket() {
    let running = start().await;

    let url = format!("ws://{}/live", running.addr);
    let stream = TcpStream::connect(running.addr).await.unwrap();
    let (_client, _) = tokio_tungstenite::client_async(url, stream).await.unwrap();

    stop(running).await;
}
