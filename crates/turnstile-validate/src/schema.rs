//! Declarative validation schemas.
//!
//! A [`Schema`] lists the declared fields of a target type in declaration
//! order. Each [`FieldSpec`] names the semantic [`Kind`] the transport value is
//! coerced into and the [`Constraint`]s checked afterwards. [`ObjectRule`]s
//! run once per object, after every field has been checked.
//!
//! Schemas are plain `const` data and are normally declared as statics:
//!
//! ```
//! use turnstile_validate::{Constraint, FieldSpec, Kind, Rule, Schema};
//!
//! static ROOM_QUERY: Schema = Schema::new(
//!     "RoomQuery",
//!     &[
//!         FieldSpec::required("name", Kind::String)
//!             .constrained(&[Constraint::new(Rule::NotEmpty)]),
//!         FieldSpec::optional("seat_ids", Kind::IntegerList),
//!     ],
//! );
//!
//! assert_eq!(ROOM_QUERY.field_names().collect::<Vec<_>>(), ["name", "seat_ids"]);
//! ```

use crate::violation::{Code, Violation};
use serde_json::{Map, Value};
use turnstile_core::RequestContext;

/// The semantic type a field is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A signed integer. Numeric strings are parsed.
    Integer,
    /// Any JSON number. Numeric strings are parsed.
    Number,
    /// `true`/`false`; the strings `"true"`, `"false"`, `"1"` and `"0"` are parsed.
    Boolean,
    /// A string.
    String,
    /// A sequence of integers; a comma-separated string is split and parsed.
    IntegerList,
    /// A sequence of strings; a comma-separated string is split.
    StringList,
    /// A JSON object.
    Object,
    /// Any value, unchecked.
    Any,
}

impl Kind {
    /// Returns the type name used in messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Integer => "an integer number",
            Self::Number => "a number",
            Self::Boolean => "a boolean value",
            Self::String => "a string",
            Self::IntegerList => "a list of integer numbers",
            Self::StringList => "a list of strings",
            Self::Object => "an object",
            Self::Any => "any value",
        }
    }
}

/// A single check applied to a coerced value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Numeric lower bound, inclusive. Applies to every element of a list.
    Min(i64),
    /// Numeric upper bound, inclusive. Applies to every element of a list.
    Max(i64),
    /// Minimum string length in characters, or minimum list length.
    MinLength(usize),
    /// Maximum string length in characters, or maximum list length.
    MaxLength(usize),
    /// The string, list or object must not be empty.
    NotEmpty,
    /// The string must be one of the listed values.
    OneOf(&'static [&'static str]),
}

impl Rule {
    /// Returns the violation code for this rule.
    #[must_use]
    pub const fn code(self) -> Code {
        match self {
            Self::Min(_) => Code::Min,
            Self::Max(_) => Code::Max,
            Self::MinLength(_) => Code::MinLength,
            Self::MaxLength(_) => Code::MaxLength,
            Self::NotEmpty => Code::NotEmpty,
            Self::OneOf(_) => Code::OneOf,
        }
    }
}

/// A rule plus its reporting policy.
///
/// A constraint flagged `general` still fails validation, but the reported
/// error omits its message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    /// The check.
    pub rule: Rule,
    /// Suppress the detail message when this constraint is reported.
    pub general: bool,
    /// Overrides the generated message.
    pub message: Option<&'static str>,
}

impl Constraint {
    /// Creates a constraint with the generated message.
    #[must_use]
    pub const fn new(rule: Rule) -> Self {
        Self {
            rule,
            general: false,
            message: None,
        }
    }

    /// Flags the constraint as general.
    #[must_use]
    pub const fn general(self) -> Self {
        Self {
            general: true,
            ..self
        }
    }

    /// Replaces the generated message.
    #[must_use]
    pub const fn with_message(self, message: &'static str) -> Self {
        Self {
            message: Some(message),
            ..self
        }
    }
}

/// A declared field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Field name as it appears on the wire.
    pub name: &'static str,
    /// Target kind.
    pub kind: Kind,
    /// Missing and `null` values are accepted and skipped.
    pub optional: bool,
    /// Suppress messages for the presence and type checks of this field.
    pub general: bool,
    /// Constraints checked in order after coercion.
    pub constraints: &'static [Constraint],
}

impl FieldSpec {
    /// Declares a required field.
    #[must_use]
    pub const fn required(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            optional: false,
            general: false,
            constraints: &[],
        }
    }

    /// Declares an optional field.
    #[must_use]
    pub const fn optional(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            optional: true,
            general: false,
            constraints: &[],
        }
    }

    /// Sets the constraints.
    #[must_use]
    pub const fn constrained(self, constraints: &'static [Constraint]) -> Self {
        Self {
            constraints,
            ..self
        }
    }

    /// Flags the presence and type checks of this field as general.
    #[must_use]
    pub const fn general(self) -> Self {
        Self {
            general: true,
            ..self
        }
    }
}

/// A whole-object check run after the field pass.
pub type ObjectCheck = fn(&Map<String, Value>, Option<&RequestContext>) -> Option<Violation>;

/// A cross-field rule.
#[derive(Clone, Copy)]
pub enum ObjectRule {
    /// `first` and `second` may not both be present and non-null.
    ///
    /// The violation is reported on `second`, the later-declared field.
    Exclusive {
        /// The earlier-declared field.
        first: &'static str,
        /// The later-declared field, which carries the violation.
        second: &'static str,
        /// The reported code.
        code: Code,
        /// Suppress the detail message.
        general: bool,
    },
    /// A custom check over the coerced object and the request context.
    Check {
        /// Name used in logs.
        name: &'static str,
        /// The check.
        check: ObjectCheck,
    },
}

impl ObjectRule {
    /// Declares two mutually exclusive fields.
    #[must_use]
    pub const fn exclusive(first: &'static str, second: &'static str) -> Self {
        Self::Exclusive {
            first,
            second,
            code: Code::Exclusive,
            general: false,
        }
    }

    /// Declares a custom object check.
    #[must_use]
    pub const fn check(name: &'static str, check: ObjectCheck) -> Self {
        Self::Check { name, check }
    }
}

impl std::fmt::Debug for ObjectRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclusive {
                first,
                second,
                code,
                general,
            } => f
                .debug_struct("Exclusive")
                .field("first", first)
                .field("second", second)
                .field("code", code)
                .field("general", general)
                .finish(),
            Self::Check { name, .. } => f.debug_struct("Check").field("name", name).finish(),
        }
    }
}

/// The validation schema of a target type.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    name: &'static str,
    fields: &'static [FieldSpec],
    object_rules: &'static [ObjectRule],
}

impl Schema {
    /// A schema with no fields; every supplied field is rejected.
    pub const EMPTY: Self = Self::new("Empty", &[]);

    /// Creates a schema from fields in declaration order.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self {
            name,
            fields,
            object_rules: &[],
        }
    }

    /// Sets the cross-field rules.
    #[must_use]
    pub const fn with_object_rules(self, object_rules: &'static [ObjectRule]) -> Self {
        Self {
            object_rules,
            ..self
        }
    }

    /// Returns the target type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared fields in declaration order.
    #[must_use]
    pub const fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Returns the cross-field rules.
    #[must_use]
    pub const fn object_rules(&self) -> &'static [ObjectRule] {
        self.object_rules
    }

    /// Looks up a declared field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true when `name` is declared.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the declared field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.name)
    }

    /// Returns the declaration index of a field.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
