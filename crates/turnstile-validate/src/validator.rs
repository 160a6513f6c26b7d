//! The validation pass.
//!
//! Validation runs in two phases over a JSON object:
//!
//! 1. **Field pass** - every declared field, in declaration order, is checked
//!    for presence, coerced into its [`Kind`] and run through its
//!    constraints. Undeclared fields are then rejected (whitelist).
//! 2. **Object pass** - every [`ObjectRule`] runs once over the object.
//!
//! The outcome is a [`ValidationReport`]; the
//! [`ValidationErrorNormalizer`](crate::ValidationErrorNormalizer) turns it
//! into at most one [`ApiError`].

use crate::coerce::coerce;
use crate::normalizer::ValidationErrorNormalizer;
use crate::schema::{Constraint, FieldSpec, Kind, ObjectRule, Rule, Schema};
use crate::violation::{Code, FieldFailure, ValidationReport, Violation};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use turnstile_core::{ApiError, Payload, RequestContext};

/// A type bound from validated transport input.
///
/// The schema describes the wire shape; `serde` then builds the value from
/// the coerced object, so defaults belong on the serde side
/// (`#[serde(default)]`).
pub trait Validate: DeserializeOwned {
    /// Returns the schema of this type.
    fn schema() -> &'static Schema;
}

/// A target type with no fields.
///
/// Used for operations that take no query or no body; any supplied field is
/// rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Empty {}

impl Validate for Empty {
    fn schema() -> &'static Schema {
        &Schema::EMPTY
    }
}

/// Runs both validation phases of `schema` over `input`.
#[must_use]
pub fn check(
    schema: &Schema,
    input: &Map<String, Value>,
    context: Option<&RequestContext>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for field in schema.fields() {
        match check_field(field, input.get(field.name)) {
            FieldOutcome::Absent => {}
            FieldOutcome::Valid(value) => {
                report.value.insert(field.name.to_string(), value);
            }
            FieldOutcome::Invalid(violations) => report.field_failures.push(FieldFailure {
                property: field.name.to_string(),
                violations,
            }),
        }
    }

    for key in input.keys().filter(|key| !schema.declares(key)) {
        report.field_failures.push(FieldFailure {
            property: key.clone(),
            violations: vec![Violation::new(
                key.clone(),
                Code::Whitelist,
                format!("property {key} should not exist"),
            )],
        });
    }

    for rule in schema.object_rules() {
        match rule {
            ObjectRule::Exclusive {
                first,
                second,
                code,
                general,
            } => {
                if is_present(input, first) && is_present(input, second) {
                    report.object_violations.push(
                        Violation::new(
                            *second,
                            *code,
                            format!("{first} and {second} cannot be used together"),
                        )
                        .general(*general),
                    );
                }
            }
            ObjectRule::Check { name, check } => {
                if let Some(violation) = check(&report.value, context) {
                    tracing::trace!(rule = name, property = %violation.property, "object check failed");
                    report.object_violations.push(violation);
                }
            }
        }
    }

    report
}

/// Validates `input` and binds it to `T`.
///
/// `input` must be a JSON object; `null` is treated as an empty object.
pub fn validate<T: Validate>(input: &Value, context: Option<&RequestContext>) -> Result<T, ApiError> {
    let schema = T::schema();
    let empty = Map::new();
    let object = match input {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(ApiError::invalid_input(
                schema.name(),
                Some(format!("{} must be an object", schema.name())),
            ))
        }
    };

    let report = check(schema, object, context);
    if let Some(error) = ValidationErrorNormalizer::normalize(&report) {
        tracing::debug!(
            target_type = schema.name(),
            violations = report.violations().count(),
            error = %error,
            "validation rejected input"
        );
        return Err(error);
    }

    bind(schema, report.into_value())
}

/// Validates the body of a payload, keeping the attached context.
///
/// Rules see the context through the payload; it is never part of the
/// validated object.
pub fn validate_payload<T: Validate>(payload: Payload) -> Result<Payload<T>, ApiError> {
    let bound = validate::<T>(payload.body(), payload.context())?;
    Ok(payload.map(|_| bound))
}

fn bind<T: DeserializeOwned>(schema: &Schema, value: Map<String, Value>) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(value)).map_err(|e| {
        tracing::error!(target_type = schema.name(), error = %e, "schema and target type disagree");
        ApiError::internal_with_source(format!("failed to bind {}", schema.name()), e)
    })
}

fn is_present(input: &Map<String, Value>, name: &str) -> bool {
    input.get(name).is_some_and(|v| !v.is_null())
}

enum FieldOutcome {
    Absent,
    Valid(Value),
    Invalid(Vec<Violation>),
}

fn check_field(field: &FieldSpec, raw: Option<&Value>) -> FieldOutcome {
    let raw = match raw {
        Some(value) if !value.is_null() => value,
        _ if field.optional => return FieldOutcome::Absent,
        _ => {
            return FieldOutcome::Invalid(vec![Violation::new(
                field.name,
                Code::Required,
                format!("{} should not be null or undefined", field.name),
            )
            .general(field.general)]);
        }
    };

    let Some(value) = coerce(raw, field.kind) else {
        return FieldOutcome::Invalid(vec![Violation::new(
            field.name,
            Code::Type,
            format!("{} must be {}", field.name, field.kind.describe()),
        )
        .general(field.general)]);
    };

    let violations: Vec<Violation> = field
        .constraints
        .iter()
        .filter(|c| !satisfies(&value, c.rule))
        .map(|c| violation_for(field, c))
        .collect();

    if violations.is_empty() {
        FieldOutcome::Valid(value)
    } else {
        FieldOutcome::Invalid(violations)
    }
}

fn satisfies(value: &Value, rule: Rule) -> bool {
    match (rule, value) {
        (Rule::Min(min), Value::Array(items)) => items.iter().all(|v| satisfies(v, Rule::Min(min))),
        (Rule::Max(max), Value::Array(items)) => items.iter().all(|v| satisfies(v, Rule::Max(max))),
        (Rule::Min(min), Value::Number(n)) => n.as_f64().is_some_and(|f| f >= min as f64),
        (Rule::Max(max), Value::Number(n)) => n.as_f64().is_some_and(|f| f <= max as f64),
        (Rule::MinLength(len), Value::String(s)) => s.chars().count() >= len,
        (Rule::MaxLength(len), Value::String(s)) => s.chars().count() <= len,
        (Rule::MinLength(len), Value::Array(items)) => items.len() >= len,
        (Rule::MaxLength(len), Value::Array(items)) => items.len() <= len,
        (Rule::NotEmpty, Value::String(s)) => !s.trim().is_empty(),
        (Rule::NotEmpty, Value::Array(items)) => !items.is_empty(),
        (Rule::NotEmpty, Value::Object(map)) => !map.is_empty(),
        (Rule::OneOf(allowed), Value::String(s)) => allowed.contains(&s.as_str()),
        // A rule that does not apply to the coerced kind cannot fail.
        _ => true,
    }
}

fn violation_for(field: &FieldSpec, constraint: &Constraint) -> Violation {
    let message = constraint
        .message
        .map_or_else(|| describe(field, constraint.rule), ToString::to_string);
    Violation::new(field.name, constraint.rule.code(), message).general(constraint.general)
}

fn describe(field: &FieldSpec, rule: Rule) -> String {
    let name = field.name;
    let is_list = matches!(field.kind, Kind::IntegerList | Kind::StringList);
    let each = if is_list { "each value in " } else { "" };

    match rule {
        Rule::Min(min) => format!("{each}{name} must not be less than {min}"),
        Rule::Max(max) => format!("{each}{name} must not be greater than {max}"),
        Rule::MinLength(len) if is_list => format!("{name} must contain at least {len} elements"),
        Rule::MaxLength(len) if is_list => {
            format!("{name} must contain no more than {len} elements")
        }
        Rule::MinLength(len) => {
            format!("{name} must be longer than or equal to {len} characters")
        }
        Rule::MaxLength(len) => {
            format!("{name} must be shorter than or equal to {len} characters")
        }
        Rule::NotEmpty => format!("{name} should not be empty"),
        Rule::OneOf(allowed) => {
            format!("{name} must be one of the following values: {}", allowed.join(", "))
        }
    }
}
