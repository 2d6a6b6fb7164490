//! Scalar values carried by filters and by create/update field maps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::Error;

/// Field name -> value map used for `create` and `update` payloads.
pub type Fields = BTreeMap<String, Value>;

/// A backend-neutral scalar.
///
/// Adapters coerce these into the declared column kind (relational) or into
/// BSON (document). There is deliberately no list or object variant: lists only
/// appear as [`crate::Operand::In`], and nested objects are rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Short type name used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON scalar.
    ///
    /// Integral numbers that fit in `i64` become [`Value::Int`], every other
    /// number becomes [`Value::Float`].
    ///
    /// # Errors
    /// `Error::InvalidFilterValue` for arrays, objects and numbers outside the
    /// `f64` range.
    pub fn from_json(field: &str, json: &serde_json::Value) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidFilterValue {
            field: field.to_owned(),
            reason: reason.to_owned(),
        };
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else {
                    n.as_f64()
                        .map(Value::Float)
                        .ok_or_else(|| invalid("number out of range"))
                }
            }
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Array(_) => Err(invalid("nested lists are not supported")),
            serde_json::Value::Object(_) => Err(invalid("nested objects are not supported")),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json("f", &json!(null)), Ok(Value::Null));
        assert_eq!(Value::from_json("f", &json!(true)), Ok(Value::Bool(true)));
        assert_eq!(Value::from_json("f", &json!(42)), Ok(Value::Int(42)));
        assert_eq!(Value::from_json("f", &json!(1.5)), Ok(Value::Float(1.5)));
        assert_eq!(
            Value::from_json("f", &json!("x")),
            Ok(Value::String("x".to_owned()))
        );
    }

    #[test]
    fn test_from_json_large_unsigned_becomes_float() {
        let v = Value::from_json("f", &json!(u64::MAX)).unwrap();
        assert_eq!(v.kind(), "float");
    }

    #[test]
    fn test_from_json_rejects_objects() {
        let err = Value::from_json("status", &json!({"$ne": "x"})).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterValue { ref field, .. } if field == "status"));
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::String("a".to_owned()));
    }
}
