//! Error types for Turnstile.
//!
//! [`ApiError`] is the single error type flowing through the pipeline. Its
//! variants are matched, never downcast. Validation variants render as the
//! minimal `{property, message?}` body; every other variant renders as an
//! [`ErrorEnvelope`].

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Client input failed validation.
    Validation,
    /// Credentials missing or rejected.
    Authentication,
    /// Permission denied.
    Authorization,
    /// Resource not found.
    NotFound,
    /// Conflicting state.
    Conflict,
    /// Request exceeded its time budget.
    Timeout,
    /// The pipeline is wired incorrectly.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Configuration | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Turnstile.
///
/// # Example
///
/// ```
/// use turnstile_core::{ApiError, ErrorCategory};
///
/// let err = ApiError::invalid_input("limit", Some("limit must not be greater than 100"));
/// assert_eq!(err.category(), ErrorCategory::Validation);
/// assert_eq!(err.status_code().as_u16(), 400);
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// A payload field failed validation.
    #[error("invalid input for `{property}`")]
    InvalidInput {
        /// The failing field.
        property: String,
        /// Detail message, absent for rules flagged general.
        message: Option<String>,
    },

    /// `offset` and `cursor` were both supplied.
    #[error("cursor conflict on `{property}`")]
    CursorConflict {
        /// The field whose evaluation detected the conflict.
        property: String,
        /// Detail message, absent for rules flagged general.
        message: Option<String>,
    },

    /// The envelope stage ran under a host the pipeline does not serve.
    #[error("unsupported transport: {host}")]
    UnsupportedTransport {
        /// Name of the offending host kind.
        host: String,
    },

    /// Credentials were present but rejected.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// The caller may not perform the operation.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Conflicting state.
    #[error("conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// The request timed out.
    #[error("timeout: {message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },

    /// Internal server error.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ApiError {
    /// Creates an invalid-input error.
    #[must_use]
    pub fn invalid_input(property: impl Into<String>, message: Option<impl Into<String>>) -> Self {
        Self::InvalidInput {
            property: property.into(),
            message: message.map(Into::into),
        }
    }

    /// Creates a cursor-conflict error.
    #[must_use]
    pub fn cursor_conflict(property: impl Into<String>, message: Option<impl Into<String>>) -> Self {
        Self::CursorConflict {
            property: property.into(),
            message: message.map(Into::into),
        }
    }

    /// Creates an unsupported-transport error.
    #[must_use]
    pub fn unsupported_transport(host: impl Into<String>) -> Self {
        Self::UnsupportedTransport { host: host.into() }
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } | Self::CursorConflict { .. } => ErrorCategory::Validation,
            Self::UnsupportedTransport { .. } => ErrorCategory::Configuration,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::CursorConflict { .. } => "CURSOR_CONFLICT",
            Self::UnsupportedTransport { .. } => "UNSUPPORTED_TRANSPORT",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns true for errors produced by input validation.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::CursorConflict { .. })
    }

    /// Returns the `{property, message?}` body for validation errors.
    #[must_use]
    pub fn validation_body(&self) -> Option<ValidationErrorBody> {
        match self {
            Self::InvalidInput { property, message } | Self::CursorConflict { property, message } => {
                Some(ValidationErrorBody {
                    property: property.clone(),
                    message: message.clone(),
                })
            }
            _ => None,
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    /// Renders the client-facing JSON body for this error.
    ///
    /// Validation errors render as [`ValidationErrorBody`], everything else
    /// as an [`ErrorEnvelope`].
    #[must_use]
    pub fn to_body(&self, request_id: Option<&str>) -> serde_json::Value {
        let rendered = match self.validation_body() {
            Some(body) => serde_json::to_value(body),
            None => serde_json::to_value(self.to_envelope(request_id)),
        };
        rendered.unwrap_or(serde_json::Value::Null)
    }
}

/// The client-facing shape of a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    /// The failing field.
    pub property: String,
    /// Detail message, omitted for rules flagged general.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Serializable error envelope for non-validation errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The correlation id of the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_error() {
        let error = ApiError::invalid_input("limit", Some("limit must be an integer number"));
        assert_eq!(error.category(), ErrorCategory::Validation);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.is_validation());
    }

    #[test]
    fn test_cursor_conflict_is_client_error() {
        let error = ApiError::cursor_conflict("cursor", None::<String>);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.error_code(), "CURSOR_CONFLICT");
    }

    #[test]
    fn test_unsupported_transport_is_server_error() {
        let error = ApiError::unsupported_transport("rpc");
        assert_eq!(error.category(), ErrorCategory::Configuration);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.is_validation());
        assert!(error.to_string().contains("rpc"));
    }

    #[test]
    fn test_validation_body_omits_absent_message() {
        let error = ApiError::invalid_input("password", None::<String>);
        let body = error.to_body(Some("req-1"));
        assert_eq!(body, serde_json::json!({ "property": "password" }));
    }

    #[test]
    fn test_validation_body_keeps_message() {
        let error = ApiError::cursor_conflict("cursor", Some("offset and cursor are mutually exclusive"));
        let body = error.to_body(None);
        assert_eq!(body["property"], "cursor");
        assert_eq!(body["message"], "offset and cursor are mutually exclusive");
    }

    #[test]
    fn test_error_envelope_serialization() {
        let error = ApiError::not_found("room 12");
        let json = serde_json::to_string(&error.to_envelope(Some("req-456"))).unwrap();
        assert!(json.contains("\"code\":\"NOT_FOUND\""));
        assert!(json.contains("\"request_id\":\"req-456\""));
        assert!(json.contains("\"category\":\"not_found\""));
    }

    #[test]
    fn test_internal_source_not_exposed() {
        let error = ApiError::internal_with_source("store failed", anyhow::anyhow!("pg: password=hunter2"));
        let body = error.to_body(None).to_string();
        assert!(body.contains("store failed"));
        assert!(!body.contains("hunter2"));
    }

    #[test]
    fn test_all_error_categories_have_status_codes() {
        let categories = [
            ErrorCategory::Validation,
            ErrorCategory::Authentication,
            ErrorCategory::Authorization,
            ErrorCategory::NotFound,
            ErrorCategory::Conflict,
            ErrorCategory::Timeout,
            ErrorCategory::Configuration,
            ErrorCategory::Internal,
        ];

        for category in categories {
            let status = category.default_status_code();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "Category {:?} should map to error status code, got {}",
                category,
                status
            );
        }
    }
}
