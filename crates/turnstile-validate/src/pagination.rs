//! Pagination query parameters.
//!
//! `limit` defaults to [`DEFAULT_LIMIT`] and is bounded by `[0, MAX_LIMIT]`.
//! `offset` and `cursor` are optional, non-negative and mutually exclusive:
//! supplying both fails with a cursor conflict whatever the other fields
//! hold.
//!
//! Query types that combine pagination with their own filters reuse the
//! field specs and the conflict rule:
//!
//! ```
//! use serde::Deserialize;
//! use turnstile_validate::pagination::{CURSOR_CONFLICT, CURSOR_FIELD, LIMIT_FIELD, OFFSET_FIELD};
//! use turnstile_validate::{FieldSpec, Kind, PaginationParams, Schema, Validate};
//!
//! #[derive(Deserialize)]
//! struct ListRooms {
//!     #[serde(flatten)]
//!     page: PaginationParams,
//!     #[serde(default)]
//!     ids: Vec<i64>,
//! }
//!
//! static LIST_ROOMS: Schema = Schema::new(
//!     "ListRooms",
//!     &[LIMIT_FIELD, OFFSET_FIELD, CURSOR_FIELD, FieldSpec::optional("ids", Kind::IntegerList)],
//! )
//! .with_object_rules(&[CURSOR_CONFLICT]);
//!
//! impl Validate for ListRooms {
//!     fn schema() -> &'static Schema {
//!         &LIST_ROOMS
//!     }
//! }
//!
//! let query = serde_json::json!({ "limit": "5", "ids": "1,2" });
//! let parsed: ListRooms = turnstile_validate::validate(&query, None).unwrap();
//! assert_eq!(parsed.page.limit, 5);
//! assert_eq!(parsed.ids, vec![1, 2]);
//! ```

use crate::schema::{Constraint, FieldSpec, Kind, ObjectRule, Rule, Schema};
use crate::validator::{validate, Validate};
use crate::violation::Code;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use turnstile_core::ApiError;

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 100;

/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 100;

/// The `limit` field spec.
pub const LIMIT_FIELD: FieldSpec = FieldSpec::optional("limit", Kind::Integer).constrained(&[
    Constraint::new(Rule::Min(0)),
    Constraint::new(Rule::Max(MAX_LIMIT as i64)),
]);

/// The `offset` field spec.
pub const OFFSET_FIELD: FieldSpec =
    FieldSpec::optional("offset", Kind::Integer).constrained(&[Constraint::new(Rule::Min(0))]);

/// The `cursor` field spec.
pub const CURSOR_FIELD: FieldSpec =
    FieldSpec::optional("cursor", Kind::Integer).constrained(&[Constraint::new(Rule::Min(0))]);

/// The `offset`/`cursor` exclusivity rule.
pub const CURSOR_CONFLICT: ObjectRule = ObjectRule::Exclusive {
    first: "offset",
    second: "cursor",
    code: Code::CursorConflict,
    general: false,
};

static PAGINATION: Schema = Schema::new("PaginationParams", &[LIMIT_FIELD, OFFSET_FIELD, CURSOR_FIELD])
    .with_object_rules(&[CURSOR_CONFLICT]);

/// Validated pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: Option<u64>,
    /// Position to resume after.
    #[serde(default)]
    pub cursor: Option<u64>,
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: None,
            cursor: None,
        }
    }
}

impl Validate for PaginationParams {
    fn schema() -> &'static Schema {
        &PAGINATION
    }
}

/// The page a set of parameters selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Start from the beginning.
    First {
        /// Page size.
        limit: u32,
    },
    /// Skip `offset` items.
    Offset {
        /// Page size.
        limit: u32,
        /// Items to skip.
        offset: u64,
    },
    /// Resume after `cursor`.
    Cursor {
        /// Page size.
        limit: u32,
        /// Resume position.
        cursor: u64,
    },
}

impl PaginationParams {
    /// Returns the selected page.
    ///
    /// Validated parameters never carry both `offset` and `cursor`; if
    /// constructed by hand with both, `cursor` wins.
    #[must_use]
    pub const fn page(&self) -> Page {
        match (self.offset, self.cursor) {
            (_, Some(cursor)) => Page::Cursor {
                limit: self.limit,
                cursor,
            },
            (Some(offset), None) => Page::Offset {
                limit: self.limit,
                offset,
            },
            (None, None) => Page::First { limit: self.limit },
        }
    }
}

/// Validates and normalizes pagination query parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationValidator;

impl PaginationValidator {
    /// Validates a query object.
    pub fn validate(query: &Value) -> Result<PaginationParams, ApiError> {
        validate::<PaginationParams>(query, None)
    }
}
