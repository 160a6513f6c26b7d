//! # Turnstile Validate
//!
//! Declarative validation of inbound payloads and query parameters.
//!
//! A target type implements [`Validate`] by pointing at a static [`Schema`].
//! Validation coerces transport values (query strings are always strings),
//! checks every declared field in order, rejects undeclared fields, runs
//! cross-field rules and finally reports at most one error through the
//! [`ValidationErrorNormalizer`].
//!
//! ## Example
//!
//! ```
//! use serde::Deserialize;
//! use turnstile_validate::{validate, Constraint, FieldSpec, Kind, Rule, Schema, Validate};
//!
//! #[derive(Debug, Deserialize)]
//! struct Rename {
//!     name: String,
//! }
//!
//! static RENAME: Schema = Schema::new(
//!     "Rename",
//!     &[FieldSpec::required("name", Kind::String).constrained(&[Constraint::new(Rule::NotEmpty)])],
//! );
//!
//! impl Validate for Rename {
//!     fn schema() -> &'static Schema {
//!         &RENAME
//!     }
//! }
//!
//! let ok: Rename = validate(&serde_json::json!({ "name": "lobby" }), None).unwrap();
//! assert_eq!(ok.name, "lobby");
//!
//! let err = validate::<Rename>(&serde_json::json!({ "name": "" }), None).unwrap_err();
//! assert_eq!(err.status_code().as_u16(), 400);
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-validate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod coerce;
mod normalizer;
pub mod pagination;
mod schema;
mod validator;
mod violation;

pub use coerce::coerce;
pub use normalizer::ValidationErrorNormalizer;
pub use pagination::{Page, PaginationParams, PaginationValidator};
pub use schema::{Constraint, FieldSpec, Kind, ObjectCheck, ObjectRule, Rule, Schema};
pub use validator::{check, validate, validate_payload, Empty, Validate};
pub use violation::{Code, FieldFailure, ValidationReport, Violation};
