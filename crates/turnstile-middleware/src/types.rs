//! HTTP request and response types used by the pipeline.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde_json::Value;
use turnstile_core::{ApiError, CorrelationId};

/// The HTTP request type used in the middleware pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Response constructors.
pub trait ResponseExt {
    /// A JSON response.
    fn json(status: StatusCode, body: &Value) -> Response;

    /// A raw response with the given media type.
    fn bytes(status: StatusCode, content_type: &str, body: Bytes) -> Response;

    /// Renders an [`ApiError`].
    ///
    /// Validation errors render as `{property, message?}`; everything else
    /// as the error envelope carrying the correlation id.
    fn api_error(error: &ApiError, request_id: Option<CorrelationId>) -> Response;
}

impl ResponseExt for Response {
    fn json(status: StatusCode, body: &Value) -> Response {
        with_body(
            status,
            HeaderValue::from_static("application/json"),
            Bytes::from(body.to_string()),
        )
    }

    fn bytes(status: StatusCode, content_type: &str, body: Bytes) -> Response {
        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        with_body(status, content_type, body)
    }

    fn api_error(error: &ApiError, request_id: Option<CorrelationId>) -> Response {
        let request_id = request_id.map(|id| id.to_string());
        Self::json(error.status_code(), &error.to_body(request_id.as_deref()))
    }
}

fn with_body(status: StatusCode, content_type: HeaderValue, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let err = ApiError::invalid_input("limit", Some("limit must not be greater than 100"));
        let response = Response::api_error(&err, Some(CorrelationId::new()));

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            body_json(response).await,
            json!({ "property": "limit", "message": "limit must not be greater than 100" })
        );
    }

    #[tokio::test]
    async fn test_other_errors_use_envelope() {
        let id = CorrelationId::new();
        let response = Response::api_error(&ApiError::not_found("room 4"), Some(id));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["request_id"], id.to_string());
        assert!(body["error"]["code"].is_string());
    }

    #[test]
    fn test_invalid_content_type_falls_back() {
        let response = Response::bytes(StatusCode::OK, "bad\nvalue", Bytes::from_static(b"x"));
        assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
    }
}
