//! Coercion from transport values into declared kinds.
//!
//! Query strings arrive as strings (or arrays of strings for repeated keys),
//! JSON bodies arrive typed. Both are coerced here, during validation, never
//! before.

use crate::schema::Kind;
use serde_json::{Number, Value};

/// Coerces `value` into `kind`, returning `None` when it does not fit.
#[must_use]
pub fn coerce(value: &Value, kind: Kind) -> Option<Value> {
    match kind {
        Kind::Integer => integer(value).map(Value::from),
        Kind::Number => number(value).map(Value::Number),
        Kind::Boolean => boolean(value).map(Value::Bool),
        Kind::String => value.as_str().map(|s| Value::String(s.to_string())),
        Kind::IntegerList => list(value)?
            .iter()
            .map(integer)
            .collect::<Option<Vec<_>>>()
            .map(|items| Value::Array(items.into_iter().map(Value::from).collect())),
        Kind::StringList => list(value)?
            .iter()
            .map(|v| v.as_str().map(|s| Value::String(s.to_string())))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        Kind::Object => value.is_object().then(|| value.clone()),
        Kind::Any => Some(value.clone()),
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    }
}

fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Splits a transport value into list items.
///
/// Arrays are taken element-wise; every string element (and a bare string)
/// is split on commas. Empty segments are dropped.
fn list(value: &Value) -> Option<Vec<Value>> {
    let split = |s: &str| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| Value::String(part.to_string()))
            .collect::<Vec<_>>()
    };

    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .flat_map(|item| match item {
                    Value::String(s) => split(s),
                    other => vec![other.clone()],
                })
                .collect(),
        ),
        Value::String(s) => Some(split(s)),
        Value::Number(_) => Some(vec![value.clone()]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_from_string_and_number() {
        assert_eq!(coerce(&json!("20"), Kind::Integer), Some(json!(20)));
        assert_eq!(coerce(&json!(" -3 "), Kind::Integer), Some(json!(-3)));
        assert_eq!(coerce(&json!(7), Kind::Integer), Some(json!(7)));
        assert_eq!(coerce(&json!(7.0), Kind::Integer), Some(json!(7)));
        assert_eq!(coerce(&json!(7.5), Kind::Integer), None);
        assert_eq!(coerce(&json!("7.5"), Kind::Integer), None);
        assert_eq!(coerce(&json!("abc"), Kind::Integer), None);
        assert_eq!(coerce(&json!(true), Kind::Integer), None);
    }

    #[test]
    fn test_number() {
        assert_eq!(coerce(&json!("1.5"), Kind::Number), Some(json!(1.5)));
        assert_eq!(coerce(&json!("4"), Kind::Number), Some(json!(4)));
        assert_eq!(coerce(&json!("NaN"), Kind::Number), None);
    }

    #[test]
    fn test_boolean() {
        assert_eq!(coerce(&json!("true"), Kind::Boolean), Some(json!(true)));
        assert_eq!(coerce(&json!("0"), Kind::Boolean), Some(json!(false)));
        assert_eq!(coerce(&json!("yes"), Kind::Boolean), None);
    }

    #[test]
    fn test_string_is_strict() {
        assert_eq!(coerce(&json!("x"), Kind::String), Some(json!("x")));
        assert_eq!(coerce(&json!(1), Kind::String), None);
    }

    #[test]
    fn test_integer_list_from_comma_separated() {
        assert_eq!(coerce(&json!("1,2, 3"), Kind::IntegerList), Some(json!([1, 2, 3])));
        assert_eq!(coerce(&json!(["1,2", "3"]), Kind::IntegerList), Some(json!([1, 2, 3])));
        assert_eq!(coerce(&json!([4, 5]), Kind::IntegerList), Some(json!([4, 5])));
        assert_eq!(coerce(&json!(9), Kind::IntegerList), Some(json!([9])));
        assert_eq!(coerce(&json!(""), Kind::IntegerList), Some(json!([])));
        assert_eq!(coerce(&json!("1,x"), Kind::IntegerList), None);
        assert_eq!(coerce(&json!({"a": 1}), Kind::IntegerList), None);
    }

    #[test]
    fn test_string_list() {
        assert_eq!(coerce(&json!("a,b"), Kind::StringList), Some(json!(["a", "b"])));
        assert_eq!(coerce(&json!([1]), Kind::StringList), None);
    }

    #[test]
    fn test_object_and_any() {
        assert_eq!(coerce(&json!({"a": 1}), Kind::Object), Some(json!({"a": 1})));
        assert_eq!(coerce(&json!([]), Kind::Object), None);
        assert_eq!(coerce(&json!(null), Kind::Any), Some(json!(null)));
    }
}
