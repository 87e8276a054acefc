//! Name/value pairs whose value kind is chosen per instance
//!
//! Dynamic fields carry ad-hoc attributes (e.g. custom form answers) without
//! changing the schema. The array form is `{"name": ..., "<kind>_val": ...}`.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{json, Map, Value as Json};

use crate::error::{Result, SchemaError};
use crate::field::FieldBuilder;
use crate::types::value::Value;
use crate::types::Type;

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_-]*$").expect("dynamic field name regex is valid"));

/// The typed value of a dynamic field
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    Bool(bool),
    Date(NaiveDate),
    Float(f64),
    Int(i64),
    String(String),
    Text(String),
}

impl DynamicValue {
    /// Key holding the value in the array form, e.g. `int_val`
    pub fn kind(&self) -> &'static str {
        match self {
            DynamicValue::Bool(_) => "bool_val",
            DynamicValue::Date(_) => "date_val",
            DynamicValue::Float(_) => "float_val",
            DynamicValue::Int(_) => "int_val",
            DynamicValue::String(_) => "string_val",
            DynamicValue::Text(_) => "text_val",
        }
    }

    fn value_type(&self) -> Type {
        match self {
            DynamicValue::Bool(_) => Type::Boolean,
            DynamicValue::Date(_) => Type::Date,
            DynamicValue::Float(_) => Type::Float,
            DynamicValue::Int(_) => Type::Int,
            DynamicValue::String(_) => Type::String,
            DynamicValue::Text(_) => Type::Text,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            DynamicValue::Bool(b) => Value::Bool(*b),
            DynamicValue::Date(d) => Value::Date(*d),
            DynamicValue::Float(x) => Value::Float(*x),
            DynamicValue::Int(i) => Value::Int(*i),
            DynamicValue::String(s) | DynamicValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// A named, typed value
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicField {
    name: String,
    value: DynamicValue,
}

impl DynamicField {
    /// Create a dynamic field, guarding the value with its kind's type
    ///
    /// `int` values are unsigned 32-bit, `string` values at most 255 bytes and
    /// `text` values at most 65535 bytes.
    pub fn new(name: impl Into<String>, value: DynamicValue) -> Result<Self> {
        let name = name.into();
        if !NAME_REGEX.is_match(&name) {
            return Err(SchemaError::validation(
                "dynamic_field",
                &name,
                "name must match [a-zA-Z_][a-zA-Z0-9_-]*",
            ));
        }

        let kind = value.value_type();
        let field = FieldBuilder::new(value.kind(), kind).build()?;
        kind.guard(&value.to_value(), &field)?;

        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &DynamicValue {
        &self.value
    }

    /// Array form of this field
    pub fn to_value(&self) -> Json {
        let value = match &self.value {
            DynamicValue::Bool(b) => json!(b),
            DynamicValue::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
            DynamicValue::Float(x) => json!(x),
            DynamicValue::Int(i) => json!(i),
            DynamicValue::String(s) | DynamicValue::Text(s) => json!(s),
        };

        let mut map = Map::new();
        map.insert("name".to_string(), json!(self.name));
        map.insert(self.value.kind().to_string(), value);
        Json::Object(map)
    }

    /// Build a dynamic field from its array form
    pub fn from_value(encoded: &Json) -> Result<Self> {
        let fail = |detail: &str| SchemaError::decode("dynamic_field", Type::DynamicField.name(), encoded, detail);

        let map = encoded.as_object().ok_or_else(|| fail("expected an object"))?;
        let name = map
            .get("name")
            .and_then(Json::as_str)
            .ok_or_else(|| fail("missing [name]"))?;

        let (kind, raw) = map
            .iter()
            .find(|(k, _)| k.ends_with("_val"))
            .ok_or_else(|| fail("missing a [<kind>_val] entry"))?;

        let value = match kind.as_str() {
            "bool_val" => raw.as_bool().map(DynamicValue::Bool),
            "date_val" => raw
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .map(DynamicValue::Date),
            "float_val" => raw.as_f64().map(DynamicValue::Float),
            "int_val" => raw.as_i64().map(DynamicValue::Int),
            "string_val" => raw.as_str().map(|s| DynamicValue::String(s.to_string())),
            "text_val" => raw.as_str().map(|s| DynamicValue::Text(s.to_string())),
            other => return Err(fail(&format!("unknown kind [{}]", other))),
        }
        .ok_or_else(|| fail(&format!("[{}] has the wrong shape", kind)))?;

        Self::new(name, value)
    }
}

impl fmt::Display for DynamicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.value.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_form() {
        let field = DynamicField::new("age", DynamicValue::Int(42)).unwrap();
        let encoded = field.to_value();
        assert_eq!(encoded, json!({"name": "age", "int_val": 42}));
        assert_eq!(DynamicField::from_value(&encoded).unwrap(), field);
    }

    #[test]
    fn test_value_is_guarded() {
        assert!(DynamicField::new("age", DynamicValue::Int(-1)).is_err());
        assert!(DynamicField::new("bio", DynamicValue::String("x".repeat(256))).is_err());
        assert!(DynamicField::new("bio", DynamicValue::Text("x".repeat(256))).is_ok());
    }

    #[test]
    fn test_name_is_checked() {
        assert!(DynamicField::new("9lives", DynamicValue::Bool(true)).is_err());
        assert!(DynamicField::new("has-pets", DynamicValue::Bool(true)).is_ok());
    }

    #[test]
    fn test_decode_failures() {
        assert!(DynamicField::from_value(&json!({"name": "x"})).unwrap_err().is_decode_failure());
        assert!(DynamicField::from_value(&json!({"name": "x", "int_val": "abc"}))
            .unwrap_err()
            .is_decode_failure());
        assert!(DynamicField::from_value(&json!("nope")).is_err());
    }
}
