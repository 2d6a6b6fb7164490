//! Identity codecs: caller-supplied ids to backend-native primary keys.

use std::fmt;

use bson::oid::ObjectId;
use storekit_query::{Error as QueryError, Value};

/// Backend-agnostic identity input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdInput {
    Int(i64),
    Str(String),
}

impl From<i64> for IdInput {
    fn from(v: i64) -> Self {
        IdInput::Int(v)
    }
}

impl From<String> for IdInput {
    fn from(v: String) -> Self {
        IdInput::Str(v)
    }
}

impl From<&str> for IdInput {
    fn from(v: &str) -> Self {
        IdInput::Str(v.to_owned())
    }
}

impl fmt::Display for IdInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdInput::Int(i) => write!(f, "{i}"),
            IdInput::Str(s) => f.write_str(s),
        }
    }
}

/// Per-backend identity rules: primary-key name and parse / format pair.
pub trait IdentityCodec: Send + Sync + 'static {
    type Id: Clone + Send + Sync + fmt::Debug;

    /// Primary-key field name on the backend.
    const PK: &'static str;

    /// # Errors
    /// `InvalidIdentity` when `input` is not a valid id for this backend.
    fn parse(input: &IdInput) -> Result<Self::Id, QueryError>;

    /// Canonical external form.
    fn format(id: &Self::Id) -> String;

    /// Scalar the adapter matches the primary key against.
    fn to_value(id: &Self::Id) -> Value;
}

/// Integer primary key named `id`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegerId;

impl IdentityCodec for IntegerId {
    type Id = i64;
    const PK: &'static str = "id";

    fn parse(input: &IdInput) -> Result<i64, QueryError> {
        match input {
            IdInput::Int(i) => Ok(*i),
            IdInput::Str(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| QueryError::InvalidIdentity(s.clone())),
        }
    }

    fn format(id: &i64) -> String {
        id.to_string()
    }

    fn to_value(id: &i64) -> Value {
        Value::Int(*id)
    }
}

/// MongoDB `ObjectId` primary key named `_id`.
///
/// Input is 24 hex characters in either case; the canonical form is
/// lowercase.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectIdIdentity;

impl IdentityCodec for ObjectIdIdentity {
    type Id = ObjectId;
    const PK: &'static str = "_id";

    fn parse(input: &IdInput) -> Result<ObjectId, QueryError> {
        match input {
            IdInput::Str(s) => ObjectId::parse_str(s.trim())
                .map_err(|_| QueryError::InvalidIdentity(s.clone())),
            IdInput::Int(i) => Err(QueryError::InvalidIdentity(i.to_string())),
        }
    }

    fn format(id: &ObjectId) -> String {
        id.to_hex()
    }

    fn to_value(id: &ObjectId) -> Value {
        Value::String(id.to_hex())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_integer_id_accepts_numeric_strings() {
        assert_eq!(IntegerId::parse(&IdInput::Int(5)).unwrap(), 5);
        assert_eq!(IntegerId::parse(&"42".into()).unwrap(), 42);
        assert_eq!(
            IntegerId::parse(&"abc".into()).unwrap_err(),
            QueryError::InvalidIdentity("abc".to_owned())
        );
        assert_eq!(IntegerId::format(&42), "42");
    }

    #[test]
    fn test_object_id_round_trip_is_lowercase_hex() {
        let hex = "65a1f0c2b3d4e5f60718293a";
        let id = ObjectIdIdentity::parse(&hex.into()).unwrap();
        assert_eq!(ObjectIdIdentity::format(&id), hex);

        let upper = ObjectIdIdentity::parse(&hex.to_uppercase().into()).unwrap();
        assert_eq!(upper, id);
        assert_eq!(ObjectIdIdentity::to_value(&id), Value::from(hex));
    }

    #[test]
    fn test_object_id_rejects_bad_input() {
        assert!(matches!(
            ObjectIdIdentity::parse(&"not-hex".into()),
            Err(QueryError::InvalidIdentity(_))
        ));
        assert!(matches!(
            ObjectIdIdentity::parse(&IdInput::Int(1)),
            Err(QueryError::InvalidIdentity(_))
        ));
    }
}
