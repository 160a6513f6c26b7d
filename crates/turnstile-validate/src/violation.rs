//! Structured validation results.

use serde::Serialize;
use serde_json::{Map, Value};
use turnstile_core::ApiError;

/// Violation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    /// A required field is missing or null.
    Required,
    /// The value could not be coerced into the declared kind.
    Type,
    /// Below the numeric lower bound.
    Min,
    /// Above the numeric upper bound.
    Max,
    /// Too short.
    MinLength,
    /// Too long.
    MaxLength,
    /// Empty where content is required.
    NotEmpty,
    /// Not one of the allowed values.
    OneOf,
    /// The field is not declared on the target type.
    Whitelist,
    /// Two mutually exclusive fields were both supplied.
    Exclusive,
    /// `offset` and `cursor` were both supplied.
    CursorConflict,
    /// A custom object check failed.
    Custom,
}

impl Code {
    /// Returns the code name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::Min => "min",
            Self::Max => "max",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::NotEmpty => "not_empty",
            Self::OneOf => "one_of",
            Self::Whitelist => "whitelist",
            Self::Exclusive => "exclusive",
            Self::CursorConflict => "cursor_conflict",
            Self::Custom => "custom",
        }
    }

    /// Returns true for codes that are reported ahead of every field failure.
    #[must_use]
    pub const fn is_fail_fast(self) -> bool {
        matches!(self, Self::Exclusive | Self::CursorConflict)
    }
}

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The field the violation is reported on.
    pub property: String,
    /// What failed.
    pub code: Code,
    /// Human-readable detail.
    pub message: String,
    /// Suppress `message` when this violation is reported.
    pub general: bool,
}

impl Violation {
    /// Creates a violation.
    #[must_use]
    pub fn new(property: impl Into<String>, code: Code, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            code,
            message: message.into(),
            general: false,
        }
    }

    /// Marks the violation as general.
    #[must_use]
    pub fn general(mut self, general: bool) -> Self {
        self.general = general;
        self
    }

    /// Returns the message unless the violation is general.
    #[must_use]
    pub fn reported_message(&self) -> Option<&str> {
        (!self.general).then_some(self.message.as_str())
    }

    /// Converts the violation into the error reported to the client.
    #[must_use]
    pub fn into_error(self) -> ApiError {
        let message = (!self.general).then_some(self.message);
        match self.code {
            Code::CursorConflict => ApiError::CursorConflict {
                property: self.property,
                message,
            },
            _ => ApiError::InvalidInput {
                property: self.property,
                message,
            },
        }
    }
}

/// All violations of one field, in constraint order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// The field.
    pub property: String,
    /// Its violations; never empty.
    pub violations: Vec<Violation>,
}

/// The outcome of validating one object against a schema.
///
/// Field failures are ordered by declaration order, followed by whitelist
/// violations for undeclared fields. Object violations come from the
/// cross-field pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub(crate) field_failures: Vec<FieldFailure>,
    pub(crate) object_violations: Vec<Violation>,
    pub(crate) value: Map<String, Value>,
}

impl ValidationReport {
    /// Returns true when nothing failed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.field_failures.is_empty() && self.object_violations.is_empty()
    }

    /// Returns the field failures in report order.
    #[must_use]
    pub fn field_failures(&self) -> &[FieldFailure] {
        &self.field_failures
    }

    /// Returns the cross-field violations.
    #[must_use]
    pub fn object_violations(&self) -> &[Violation] {
        &self.object_violations
    }

    /// Returns every violation: field failures first, then object violations.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.field_failures
            .iter()
            .flat_map(|f| f.violations.iter())
            .chain(self.object_violations.iter())
    }

    /// Returns the coerced object. Fields that failed are absent.
    #[must_use]
    pub fn value(&self) -> &Map<String, Value> {
        &self.value
    }

    /// Consumes the report, returning the coerced object.
    #[must_use]
    pub fn into_value(self) -> Map<String, Value> {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_message_respects_general() {
        let v = Violation::new("pin", Code::MinLength, "pin must be longer");
        assert_eq!(v.reported_message(), Some("pin must be longer"));
        assert_eq!(v.clone().general(true).reported_message(), None);
    }

    #[test]
    fn test_into_error_maps_cursor_conflict() {
        let err = Violation::new("cursor", Code::CursorConflict, "conflict").into_error();
        assert!(matches!(err, ApiError::CursorConflict { ref property, .. } if property == "cursor"));

        let err = Violation::new("limit", Code::Max, "too big").into_error();
        assert!(matches!(err, ApiError::InvalidInput { ref message, .. } if message.as_deref() == Some("too big")));
    }

    #[test]
    fn test_fail_fast_codes() {
        assert!(Code::CursorConflict.is_fail_fast());
        assert!(Code::Exclusive.is_fail_fast());
        assert!(!Code::Max.is_fail_fast());
        assert!(!Code::Custom.is_fail_fast());
    }
}
