//! # Turnstile Extract
//!
//! Raw input extraction and response result types.
//!
//! Extractors decode transport input without interpreting it: the query
//! string becomes a JSON object of strings ([`QueryMap`]) and the body an
//! optional JSON value ([`JsonBody`]). Typing and coercion are left to
//! validation.
//!
//! On the way out, operations return a [`Reply`]. Data replies carry the
//! [`ExposureSchema`] of their type so the serialization stage can drop every
//! field that is not explicitly exposed; [`ResponseEnvelope`] is the shape
//! every filtered result is wrapped in.
//!
//! ```rust
//! use turnstile_extract::{ExtractionContext, FromRequest, JsonBody, QueryMap};
//! use http::{Method, Uri};
//!
//! let ctx = ExtractionContext::builder()
//!     .method(Method::POST)
//!     .uri(Uri::from_static("/rooms?notify=true"))
//!     .body(r#"{"name":"lobby"}"#)
//!     .build();
//!
//! let (QueryMap(query), JsonBody(body)) = <(QueryMap, JsonBody)>::from_request(&ctx).unwrap();
//! assert_eq!(query["notify"], "true");
//! assert!(body.is_some());
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
pub mod exposure;
mod extractor;
mod json;
mod query;
pub mod response;

pub use context::{ExtractionContext, ExtractionContextBuilder};
pub use error::{ExtractionError, ExtractionSource};
pub use exposure::{Exposed, ExposedField, ExposureSchema};
pub use extractor::FromRequest;
pub use json::{JsonBody, DEFAULT_MAX_BODY_SIZE};
pub use query::QueryMap;
pub use response::{BinaryBody, Meta, Reply, ResponseEnvelope};
