//! Core extractor trait.

use crate::{ExtractionContext, ExtractionError};

/// Types that can be read from an HTTP request.
///
/// Extraction is synchronous and operates on a fully collected
/// [`ExtractionContext`].
///
/// ```rust
/// use turnstile_extract::{ExtractionContext, ExtractionError, FromRequest};
///
/// struct ApiVersion(Option<String>);
///
/// impl FromRequest for ApiVersion {
///     fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
///         Ok(ApiVersion(ctx.header("x-api-version").map(String::from)))
///     }
/// }
/// ```
pub trait FromRequest: Sized {
    /// Extracts this type from the request context.
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError>;
}

// Pairs let the HTTP adapter pull query and body in one call.
impl<A: FromRequest, B: FromRequest> FromRequest for (A, B) {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        Ok((A::from_request(ctx)?, B::from_request(ctx)?))
    }
}
