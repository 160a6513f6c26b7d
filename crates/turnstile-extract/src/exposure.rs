//! Field exposure allow-lists.
//!
//! Every response type declares which of its fields leave the process.
//! Anything not listed is dropped. Nested typed fields point at their own
//! schema and are projected recursively. A plain field keeps scalars and
//! arrays of scalars; any object inside it is projected through
//! [`ExposureSchema::NONE`] and leaves empty.
//!
//! ```rust
//! use turnstile_extract::{ExposedField, ExposureSchema};
//! use serde_json::json;
//!
//! static OWNER: ExposureSchema = ExposureSchema::new("Owner", &[ExposedField::plain("id")]);
//! static ROOM: ExposureSchema = ExposureSchema::new(
//!     "Room",
//!     &[ExposedField::plain("name"), ExposedField::nested("owner", &OWNER)],
//! );
//!
//! let room = json!({ "name": "lobby", "secret": "x", "owner": { "id": 1, "email": "e" } });
//! assert_eq!(ROOM.project(&room), json!({ "name": "lobby", "owner": { "id": 1 } }));
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

/// One exposed field.
#[derive(Debug, Clone, Copy)]
pub struct ExposedField {
    /// Field name.
    pub name: &'static str,
    /// Schema applied to the field's value.
    pub nested: Option<&'static ExposureSchema>,
}

impl ExposedField {
    /// An exposed field whose objects expose nothing.
    #[must_use]
    pub const fn plain(name: &'static str) -> Self {
        Self { name, nested: None }
    }

    /// An exposed field projected through `schema`.
    #[must_use]
    pub const fn nested(name: &'static str, schema: &'static ExposureSchema) -> Self {
        Self {
            name,
            nested: Some(schema),
        }
    }
}

/// The allow-list of one response type.
#[derive(Debug)]
pub struct ExposureSchema {
    name: &'static str,
    fields: &'static [ExposedField],
}

impl ExposureSchema {
    /// A schema exposing nothing.
    pub const NONE: Self = Self::new("None", &[]);

    /// Creates a schema.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [ExposedField]) -> Self {
        Self { name, fields }
    }

    /// Returns the response type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the exposed fields.
    #[must_use]
    pub const fn fields(&self) -> &'static [ExposedField] {
        self.fields
    }

    /// Returns true if `name` is exposed.
    #[must_use]
    pub fn exposes(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Projects `value` onto this schema.
    ///
    /// Objects keep only exposed fields, arrays are projected element-wise
    /// and scalars pass through.
    #[must_use]
    pub fn project(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.project_object(map)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.project(v)).collect()),
            scalar => scalar.clone(),
        }
    }

    fn project_object(&self, map: &Map<String, Value>) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|field| {
                let value = map.get(field.name)?;
                let projected = match field.nested {
                    Some(schema) => schema.project(value),
                    None => Self::NONE.project(value),
                };
                Some((field.name.to_string(), projected))
            })
            .collect()
    }
}

/// A response type with a declared allow-list.
pub trait Exposed: Serialize {
    /// Returns the allow-list of this type.
    fn exposure() -> &'static ExposureSchema;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    static AB: ExposureSchema =
        ExposureSchema::new("Ab", &[ExposedField::plain("a"), ExposedField::plain("b")]);

    static SEAT: ExposureSchema = ExposureSchema::new("Seat", &[ExposedField::plain("row")]);

    static VENUE: ExposureSchema = ExposureSchema::new(
        "Venue",
        &[
            ExposedField::plain("name"),
            ExposedField::nested("seats", &SEAT),
            ExposedField::plain("tags"),
        ],
    );

    #[test]
    fn test_extra_field_is_dropped() {
        let value = json!({ "a": 1, "b": "two", "c": true });
        assert_eq!(AB.project(&value), json!({ "a": 1, "b": "two" }));
    }

    #[test]
    fn test_missing_fields_stay_missing() {
        assert_eq!(AB.project(&json!({ "c": 1 })), json!({}));
    }

    #[test]
    fn test_nested_sequences_use_their_own_schema() {
        let value = json!({
            "name": "arena",
            "seats": [{ "row": 1, "price": 10 }, { "row": 2, "price": 12 }],
            "tags": ["vip", "aisle"],
            "revenue": 100
        });
        assert_eq!(
            VENUE.project(&value),
            json!({
                "name": "arena",
                "seats": [{ "row": 1 }, { "row": 2 }],
                "tags": ["vip", "aisle"]
            })
        );
    }

    #[test]
    fn test_plain_field_does_not_leak_objects() {
        let value = json!({
            "name": "arena",
            "tags": [{ "owner_email": "e" }, "vip"],
        });
        assert_eq!(
            VENUE.project(&value),
            json!({ "name": "arena", "tags": [{}, "vip"] })
        );

        let value = json!({ "a": { "password": "x" }, "b": [[1, 2]] });
        assert_eq!(AB.project(&value), json!({ "a": {}, "b": [[1, 2]] }));
    }

    #[test]
    fn test_scalars_and_null_pass() {
        assert_eq!(AB.project(&json!(3)), json!(3));
        assert_eq!(VENUE.project(&json!({ "seats": null })), json!({ "seats": null }));
    }

    #[test]
    fn test_none_exposes_nothing() {
        assert_eq!(ExposureSchema::NONE.project(&json!({ "a": 1 })), json!({}));
        assert!(!ExposureSchema::NONE.exposes("a"));
    }

    proptest! {
        #[test]
        fn prop_projection_keeps_only_exposed_keys(
            extra in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..8),
            a in any::<i64>(),
        ) {
            let mut map: Map<String, Value> =
                extra.into_iter().map(|(k, v)| (k, json!(v))).collect();
            map.insert("a".into(), json!(a));

            let projected = AB.project(&Value::Object(map.clone()));
            let projected = projected.as_object().unwrap();

            prop_assert!(projected.keys().all(|k| k == "a" || k == "b"));
            prop_assert_eq!(projected.get("a"), Some(&json!(a)));
            prop_assert_eq!(projected.get("b"), map.get("b"));
        }
    }
}
