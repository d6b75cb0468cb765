//! Typed key-value fields for structured records
//!
//! Fields are an ordered sequence of `(key, value)` pairs. Keys need not be
//! unique and insertion order is preserved all the way through encoding, so
//! nested `Object` fields and repeated keys round-trip the way they were
//! logged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Strings(Vec<String>),
    /// Nested fields under this key's namespace
    Object(Vec<Field>),
    /// An error value; eligible for the reporting sink's error filter
    Error(String),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Strings(v) => write!(f, "[{}]", v.join(",")),
            FieldValue::Object(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}={}", field.key, field.value)?;
                }
                write!(f, "}}")
            }
            FieldValue::Error(e) => write!(f, "{}", e),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    /// Convert to `serde_json::Value` for JSON encoding
    ///
    /// Object fields nest as JSON maps; insertion order is preserved.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Strings(v) => serde_json::Value::Array(
                v.iter().cloned().map(serde_json::Value::String).collect(),
            ),
            FieldValue::Object(fields) => {
                let mut map = serde_json::Map::new();
                for field in fields {
                    map.insert(field.key.clone(), field.value.to_json_value());
                }
                serde_json::Value::Object(map)
            }
            FieldValue::Error(e) => serde_json::Value::String(e.clone()),
            FieldValue::Null => serde_json::Value::Null,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FieldValue::Error(_))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// One structured `(key, value)` pair on a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Constructs a field with the given key and string value.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::String(value.into()),
        }
    }

    /// Constructs a field with the given key and integer value.
    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Int(value),
        }
    }

    /// Constructs a field with the given key and float value.
    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Float(value),
        }
    }

    /// Constructs a field that carries a bool.
    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Bool(value),
        }
    }

    /// Constructs a field that carries a slice of strings.
    pub fn strings(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Strings(values),
        }
    }

    /// Constructs a field that places all the given fields within the given
    /// key's namespace.
    pub fn object(key: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Object(fields),
        }
    }

    /// Shorthand for the common idiom `named_error("error", err)`.
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::named_error("error", err)
    }

    /// Constructs a field that logs the error's message under the provided key.
    ///
    /// A `None`-like nil error is not representable in Rust; pass the error
    /// message directly with [`Field::error_message`] when no `Error` value
    /// is at hand.
    pub fn named_error(key: impl Into<String>, err: &dyn std::error::Error) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Error(err.to_string()),
        }
    }

    /// Constructs an error field from a bare message.
    pub fn error_message(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Error(message.into()),
        }
    }

    /// Constructs a field with an explicit null value.
    pub fn null(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Null,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Format fields as space-separated key=value pairs
pub fn format_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_constructors() {
        let f = Field::string("user", "alice");
        assert_eq!(f.key, "user");
        assert_eq!(f.value, FieldValue::String("alice".to_string()));

        let f = Field::int("count", 42);
        assert_eq!(f.value, FieldValue::Int(42));

        let f = Field::bool("active", true);
        assert_eq!(f.value, FieldValue::Bool(true));
    }

    #[test]
    fn test_error_field() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let f = Field::error(&err);
        assert_eq!(f.key, "error");
        assert!(f.value.is_error());

        let f = Field::named_error("cause", &err);
        assert_eq!(f.key, "cause");
        assert_eq!(f.value, FieldValue::Error("missing".to_string()));
    }

    #[test]
    fn test_object_field_nesting() {
        let f = Field::object(
            "request",
            vec![Field::string("method", "GET"), Field::int("status", 200)],
        );

        let json = f.value.to_json_value();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["status"], 200);
    }

    #[test]
    fn test_json_preserves_insertion_order() {
        let f = Field::object(
            "o",
            vec![
                Field::string("zebra", "1"),
                Field::string("apple", "2"),
                Field::string("mango", "3"),
            ],
        );

        let json = f.value.to_json_value();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_format_fields() {
        let fields = vec![Field::string("k1", "v1"), Field::int("k2", 7)];
        assert_eq!(format_fields(&fields), "k1=v1 k2=7");
    }

    #[test]
    fn test_duplicate_keys_allowed() {
        let fields = vec![Field::int("n", 1), Field::int("n", 2)];
        assert_eq!(format_fields(&fields), "n=1 n=2");
    }
}
