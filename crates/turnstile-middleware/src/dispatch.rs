//! Transport-agnostic dispatch.
//!
//! HTTP requests and WebSocket messages end up here with the same three
//! things: a host kind, an optional [`RequestContext`] and the raw
//! [`Inbound`] input. [`dispatch`] runs stages 4 to 8 around the
//! [`Operation`]:
//!
//! ```text
//! inject -> validate query -> validate body -> strip -> call -> filter -> envelope
//! ```
//!
//! A failing stage ends dispatch; the operation is never called with
//! unvalidated input.

use crate::pipeline::Stage;
use crate::stages::{
    ContextInjectionStage, ContextStrippingStage, Outgoing, ResponseEnvelopeStage, SerializationFilter,
    ValidationStage,
};
use serde_json::{Map, Value};
use tracing::Instrument;
use turnstile_core::{ApiError, BoxFuture, HostKind, RequestContext};
use turnstile_extract::Reply;
use turnstile_validate::Validate;

/// Validated operation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input<Q, B> {
    /// Query parameters (HTTP query string or the `query` member of a
    /// WebSocket message).
    pub query: Q,
    /// The body with the request context already removed.
    pub body: B,
}

/// Raw input as extracted from a transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inbound {
    /// Query parameters, string-valued on HTTP.
    pub query: Map<String, Value>,
    /// The decoded body, if any.
    pub body: Option<Value>,
}

impl Inbound {
    /// Creates inbound input.
    #[must_use]
    pub fn new(query: Map<String, Value>, body: Option<Value>) -> Self {
        Self { query, body }
    }
}

/// A unit of business logic.
///
/// The operation declares what it accepts through [`Validate`] types and
/// receives the caller's context as a separate argument, never inside its
/// input.
///
/// ```ignore
/// struct ListSeats {
///     store: SeatStore,
/// }
///
/// impl Operation for ListSeats {
///     type Query = PaginationParams;
///     type Body = Empty;
///
///     fn name(&self) -> &'static str {
///         "list_seats"
///     }
///
///     fn call<'a>(
///         &'a self,
///         _context: Option<&'a RequestContext>,
///         input: Input<PaginationParams, Empty>,
///     ) -> BoxFuture<'a, Result<Reply, ApiError>> {
///         Box::pin(async move { Reply::list(&self.store.page(input.query.page()).await?) })
///     }
/// }
/// ```
pub trait Operation: Send + Sync + 'static {
    /// Query parameter type.
    type Query: Validate + Send;
    /// Body type.
    type Body: Validate + Send;

    /// Returns the operation name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the operation.
    fn call<'a>(
        &'a self,
        context: Option<&'a RequestContext>,
        input: Input<Self::Query, Self::Body>,
    ) -> BoxFuture<'a, Result<Reply, ApiError>>;
}

/// An operation with its input types erased.
///
/// Routers and gateways hold `Arc<dyn Endpoint>`; every [`Operation`] is one.
pub trait Endpoint: Send + Sync + 'static {
    /// Returns the operation name.
    fn name(&self) -> &'static str;

    /// Dispatches raw input through the pipeline.
    fn invoke<'a>(
        &'a self,
        host: HostKind,
        context: Option<&'a RequestContext>,
        inbound: Inbound,
    ) -> BoxFuture<'a, Result<Outgoing, ApiError>>;
}

impl<O: Operation> Endpoint for O {
    fn name(&self) -> &'static str {
        Operation::name(self)
    }

    fn invoke<'a>(
        &'a self,
        host: HostKind,
        context: Option<&'a RequestContext>,
        inbound: Inbound,
    ) -> BoxFuture<'a, Result<Outgoing, ApiError>> {
        Box::pin(dispatch(self, host, context, inbound))
    }
}

/// Runs `operation` for one request or message.
///
/// # Errors
///
/// Returns the first stage failure: a validation error, the operation's own
/// error, or [`ApiError::UnsupportedTransport`] for hosts without an
/// envelope.
pub async fn dispatch<O: Operation>(
    operation: &O,
    host: HostKind,
    context: Option<&RequestContext>,
    inbound: Inbound,
) -> Result<Outgoing, ApiError> {
    let span = tracing::debug_span!(
        "dispatch",
        operation = Operation::name(operation),
        host = host.as_str(),
        principal_id = context.map(RequestContext::principal_id),
    );

    async move {
        let payload = ContextInjectionStage::apply(inbound.body, context);
        tracing::trace!(stage = Stage::Injection.name(), contextual = payload.as_ref().is_some_and(|p| p.is_contextual()));

        let query = ValidationStage::query::<O::Query>(inbound.query, context)?;
        let body = ValidationStage::body::<O::Body>(payload)?;
        tracing::trace!(stage = Stage::Validation.name(), "input accepted");

        let body = ContextStrippingStage::apply(body).into_body();

        let reply = operation.call(context, Input { query, body }).await?;
        tracing::trace!(stage = Stage::Serialization.name(), pass_through = reply.is_pass_through());

        ResponseEnvelopeStage::apply(host, SerializationFilter::apply(reply))
    }
    .instrument(span)
    .await
}

/// Classifies a dispatch result for metrics: `ok`, `rejected` (client
/// errors) or `error`.
#[must_use]
pub fn outcome<T>(result: &Result<T, ApiError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) if e.status_code().is_client_error() => "rejected",
        Err(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use turnstile_core::{CorrelationId, Principal, Transport};
    use turnstile_extract::{Exposed, ExposedField, ExposureSchema, ResponseEnvelope};
    use turnstile_validate::{Empty, FieldSpec, Kind, PaginationParams, Schema};

    #[derive(Serialize)]
    struct Room {
        id: i64,
        owner_id: i64,
        secret: &'static str,
    }

    static ROOM: ExposureSchema =
        ExposureSchema::new("Room", &[ExposedField::plain("id"), ExposedField::plain("owner_id")]);

    impl Exposed for Room {
        fn exposure() -> &'static ExposureSchema {
            &ROOM
        }
    }

    #[derive(Debug, Deserialize)]
    struct CreateRoom {
        id: i64,
    }

    static CREATE_ROOM: Schema = Schema::new("CreateRoom", &[FieldSpec::required("id", Kind::Integer)]);

    impl Validate for CreateRoom {
        fn schema() -> &'static Schema {
            &CREATE_ROOM
        }
    }

    #[derive(Default)]
    struct CreateRoomOp {
        calls: AtomicUsize,
    }

    impl Operation for CreateRoomOp {
        type Query = Empty;
        type Body = CreateRoom;

        fn name(&self) -> &'static str {
            "create_room"
        }

        fn call<'a>(
            &'a self,
            context: Option<&'a RequestContext>,
            input: Input<Empty, CreateRoom>,
        ) -> BoxFuture<'a, Result<Reply, ApiError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let owner = context.ok_or_else(|| ApiError::unauthorized("login required"))?;
                Reply::data(&Room {
                    id: input.body.id,
                    owner_id: owner.principal_id(),
                    secret: "hunter2",
                })
            })
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
                let rooms: Vec<Room> = (0..i64::from(input.query.limit.min(3)))
                    .map(|id| Room { id, owner_id: 1, secret: "x" })
                    .collect();
                Reply::list(&rooms)
            })
        }
    }

    fn context(id: i64) -> RequestContext {
        RequestContext::new(&Principal::new(id), CorrelationId::new(), Transport::Http)
    }

    #[tokio::test]
    async fn test_operation_sees_context_as_argument_and_filtered_result() {
        let op = CreateRoomOp::default();
        let ctx = context(7);

        let out = dispatch(&op, HostKind::Http, Some(&ctx), Inbound::new(Map::new(), Some(json!({"id": "12"}))))
            .await
            .unwrap();

        assert_eq!(
            out,
            Outgoing::Envelope(ResponseEnvelope::wrap(json!({ "id": 12, "owner_id": 7 })))
        );
    }

    #[tokio::test]
    async fn test_invalid_body_never_reaches_operation() {
        let op = CreateRoomOp::default();
        let ctx = context(7);

        let err = dispatch(&op, HostKind::WebSocket, Some(&ctx), Inbound::new(Map::new(), Some(json!({}))))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidInput { ref property, .. } if property == "id"));
        assert_eq!(op.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_carries_size() {
        let mut query = Map::new();
        query.insert("limit".into(), json!("2"));

        let out = ListRooms.invoke(HostKind::Http, None, Inbound::new(query, None)).await.unwrap();
        let Outgoing::Envelope(envelope) = out else {
            panic!("expected envelope");
        };
        assert_eq!(envelope.meta.size, Some(2));
        assert_eq!(envelope.data, json!([{ "id": 0, "owner_id": 1 }, { "id": 1, "owner_id": 1 }]));
    }

    #[tokio::test]
    async fn test_rpc_host_is_unsupported() {
        let result = ListRooms.invoke(HostKind::Rpc, None, Inbound::default()).await;
        assert!(matches!(result, Err(ApiError::UnsupportedTransport { .. })));
        assert_eq!(outcome(&result), "error");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome::<()>(&Ok(())), "ok");
        assert_eq!(outcome::<()>(&Err(ApiError::invalid_input("x", None::<String>))), "rejected");
        assert_eq!(outcome::<()>(&Err(ApiError::internal("boom"))), "error");
    }
}
