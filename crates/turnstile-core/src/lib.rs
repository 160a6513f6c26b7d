//! # Turnstile Core
//!
//! Core types shared by every Turnstile crate.
//!
//! - [`RequestContext`] - Immutable per-request principal and transport metadata
//! - [`CorrelationId`] - UUID v7 correlation identifier
//! - [`Principal`] / [`Authenticator`] - Authenticated callers and the auth seam
//! - [`Payload`] - Inbound body carrying the optional context through validation
//! - [`ApiError`] - The tagged error enum used across the pipeline

#![doc(html_root_url = "https://docs.rs/turnstile-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod identity;
mod payload;

use std::future::Future;
use std::pin::Pin;

pub use context::{CorrelationId, HostKind, RequestContext, Transport};
pub use error::{
    ApiError, ApiResult, ErrorCategory, ErrorDetail, ErrorEnvelope, ValidationErrorBody,
};
pub use identity::{
    Anonymous, Authenticator, HeaderAuthenticator, Principal, PRINCIPAL_ID_HEADER,
    PRINCIPAL_ROLES_HEADER,
};
pub use payload::Payload;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
