//! Extraction error types.

use http::StatusCode;
use std::fmt;
use thiserror::Error;
use turnstile_core::ApiError;

/// Where extracted data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Query string parameters
    Query,
    /// Request body
    Body,
    /// Content-Type header
    ContentType,
}

impl ExtractionSource {
    /// Returns the name used as the reported property.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Body => "body",
            Self::ContentType => "content-type",
        }
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error that occurs while reading raw transport input.
///
/// Extraction only decodes; typed validation happens later in the pipeline.
///
/// # Example
///
/// ```rust
/// use turnstile_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::payload_too_large(1024, 2048);
/// assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
/// assert_eq!(err.extraction_source(), ExtractionSource::Body);
/// ```
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The input could not be decoded.
    #[error("failed to decode {source_kind}: {details}")]
    Malformed {
        /// Where the input came from.
        source_kind: ExtractionSource,
        /// Decoder message.
        details: String,
    },

    /// The body exceeds the configured limit.
    #[error("payload too large: max {max} bytes, got {actual} bytes")]
    PayloadTooLarge {
        /// Configured limit.
        max: usize,
        /// Received size.
        actual: usize,
    },

    /// The body has a content type other than JSON.
    #[error("unsupported content type: expected '{expected}', got '{actual}'")]
    UnsupportedMediaType {
        /// Accepted content type.
        expected: &'static str,
        /// Received content type.
        actual: String,
    },
}

impl ExtractionError {
    /// Creates a decoding error.
    #[must_use]
    pub fn malformed(source: ExtractionSource, details: impl Into<String>) -> Self {
        Self::Malformed {
            source_kind: source,
            details: details.into(),
        }
    }

    /// Creates an error for a body over the limit.
    #[must_use]
    pub const fn payload_too_large(max: usize, actual: usize) -> Self {
        Self::PayloadTooLarge { max, actual }
    }

    /// Creates an error for an unsupported content type.
    #[must_use]
    pub fn unsupported_media_type(expected: &'static str, actual: impl Into<String>) -> Self {
        Self::UnsupportedMediaType {
            expected,
            actual: actual.into(),
        }
    }

    /// Returns where the failing input came from.
    #[must_use]
    pub const fn extraction_source(&self) -> ExtractionSource {
        match self {
            Self::Malformed { source_kind, .. } => *source_kind,
            Self::PayloadTooLarge { .. } => ExtractionSource::Body,
            Self::UnsupportedMediaType { .. } => ExtractionSource::ContentType,
        }
    }

    /// Returns the HTTP status for this error when rendered directly.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Malformed { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

/// Undecodable input is reported the same way as invalid input, on the
/// source it came from.
impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        let property = err.extraction_source().as_str();
        ApiError::invalid_input(property, Some(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_error() {
        let err = ExtractionError::malformed(ExtractionSource::Body, "expected value at line 1");
        assert_eq!(err.extraction_source(), ExtractionSource::Body);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_payload_too_large_error() {
        let err = ExtractionError::payload_too_large(1024, 2048);
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.to_string().contains("1024"));
        assert!(err.to_string().contains("2048"));
    }

    #[test]
    fn test_unsupported_media_type_error() {
        let err = ExtractionError::unsupported_media_type("application/json", "text/plain");
        assert_eq!(err.extraction_source(), ExtractionSource::ContentType);
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_into_api_error() {
        let err: ApiError = ExtractionError::malformed(ExtractionSource::Query, "bad").into();
        assert!(matches!(err, ApiError::InvalidInput { ref property, .. } if property == "query"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
