//! Declared relational fields and scalar coercion.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use storekit_query::{Error as QueryError, Value};

/// Logical column kinds.
///
/// The kind must match the Rust type of the model field: `I64` for `i64`,
/// `F64` for `f64`, `DateTimeUtc` for `DateTime<Utc>` (optionally wrapped in
/// `Option`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    F64,
    Bool,
    DateTimeUtc,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => write!(f, "String"),
            FieldKind::I64 => write!(f, "I64"),
            FieldKind::F64 => write!(f, "F64"),
            FieldKind::Bool => write!(f, "Bool"),
            FieldKind::DateTimeUtc => write!(f, "DateTimeUtc"),
        }
    }
}

#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
}

/// Allow-list of model fields: name -> (column, kind).
///
/// Names are matched exactly, as the document adapter does.
#[derive(Clone)]
#[must_use]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(mut self, name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.map.insert(name.into(), Field { col, kind });
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.map.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared field names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// # Errors
    /// `UnknownField` when `name` is not declared.
    pub fn require(&self, name: &str) -> Result<&Field<E>, QueryError> {
        self.get(name)
            .ok_or_else(|| QueryError::UnknownField(name.to_owned()))
    }
}

/// Typed SQL `NULL` for a column kind.
fn null_of(kind: FieldKind) -> sea_orm::Value {
    match kind {
        FieldKind::String => sea_orm::Value::String(None),
        FieldKind::I64 => sea_orm::Value::BigInt(None),
        FieldKind::F64 => sea_orm::Value::Double(None),
        FieldKind::Bool => sea_orm::Value::Bool(None),
        FieldKind::DateTimeUtc => sea_orm::Value::ChronoDateTimeUtc(None),
    }
}

/// Convert a scalar into the column's native value.
///
/// Integers widen to `F64` columns and RFC 3339 strings are accepted for
/// `DateTimeUtc` columns. `Null` becomes a typed `NULL`.
///
/// # Errors
/// `InvalidFilterValue` naming `field` on a kind mismatch.
pub fn coerce(field: &str, kind: FieldKind, v: &Value) -> Result<sea_orm::Value, QueryError> {
    let mismatch = || QueryError::InvalidFilterValue {
        field: field.to_owned(),
        reason: format!("expected {kind}, got {}", v.kind()),
    };
    Ok(match (kind, v) {
        (_, Value::Null) => null_of(kind),

        (FieldKind::String, Value::String(s)) => {
            sea_orm::Value::String(Some(Box::new(s.clone())))
        }

        (FieldKind::I64, Value::Int(i)) => sea_orm::Value::BigInt(Some(*i)),

        (FieldKind::F64, Value::Float(f)) => sea_orm::Value::Double(Some(*f)),
        #[allow(clippy::cast_precision_loss)]
        (FieldKind::F64, Value::Int(i)) => sea_orm::Value::Double(Some(*i as f64)),

        (FieldKind::Bool, Value::Bool(b)) => sea_orm::Value::Bool(Some(*b)),

        (FieldKind::DateTimeUtc, Value::DateTime(dt)) => {
            sea_orm::Value::ChronoDateTimeUtc(Some(Box::new(*dt)))
        }
        (FieldKind::DateTimeUtc, Value::String(s)) => {
            let dt = DateTime::parse_from_rfc3339(s)
                .map_err(|e| QueryError::InvalidFilterValue {
                    field: field.to_owned(),
                    reason: format!("invalid RFC 3339 datetime: {e}"),
                })?
                .with_timezone(&Utc);
            sea_orm::Value::ChronoDateTimeUtc(Some(Box::new(dt)))
        }

        _ => return Err(mismatch()),
    })
}
