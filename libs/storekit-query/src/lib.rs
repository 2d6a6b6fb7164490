#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Backend-agnostic query descriptors.
//!
//! A [`QueryDescriptor`] says which records to fetch: an ordered conjunction of
//! equality / membership filters, a sort order and a `limit/offset` window.
//! Descriptors are pure data. They are produced either by the fluent
//! [`QueryBuilder`] or from the JSON-shaped [`RawQuery`], and every constructor
//! path runs the same validation against [`QueryLimits`].
//!
//! Field names are not checked here: the crate has no notion of a model
//! schema. Repositories call [`QueryDescriptor::ensure_known_fields`] with
//! their own allow-list before translating the descriptor.

pub mod builder;
pub mod descriptor;
pub mod limits;
pub mod page;
pub mod raw;
pub mod value;

pub use builder::QueryBuilder;
pub use descriptor::{DEFAULT_SORT_FIELD, Filter, Operand, Pagination, QueryDescriptor, SortKey};
pub use limits::QueryLimits;
pub use page::Page;
pub use raw::{RawFilter, RawPagination, RawQuery, RawSort};
pub use value::{Fields, Value};

// Ordering primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    /// Reverse the sort direction (Asc <-> Desc)
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDir {
    type Err = Error;

    /// Accepts `asc` / `desc` in any ASCII case. Anything else is rejected
    /// instead of silently sorting ascending.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDir::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDir::Desc)
        } else {
            Err(Error::InvalidSortDirection(s.to_owned()))
        }
    }
}

impl std::fmt::Display for SortDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for query input and identities.
///
/// Every variant names the constraint that was violated. None of them are
/// transient, so callers must not retry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Pagination
    #[error("limit must be between 1 and {max}, got {got}")]
    InvalidLimit { got: i64, max: u64 },

    #[error("offset must not be negative, got {0}")]
    InvalidOffset(i64),

    #[error("page must be between 1 and {max}, got {got}")]
    InvalidPage { got: i64, max: u64 },

    #[error("page size must be between 1 and {max}, got {got}")]
    InvalidPageSize { got: i64, max: u64 },

    #[error("limit/offset and page/size cannot be combined")]
    ConflictingPagination,

    // Sorting
    #[error("unknown sort direction: {0:?}")]
    InvalidSortDirection(String),

    #[error("too many sort fields: {got} (max: {max})")]
    TooManySortFields { got: usize, max: usize },

    // Fields and values
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid value for field {field}: {reason}")]
    InvalidFilterValue { field: String, reason: String },

    // Identities
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

pub type Result<T> = std::result::Result<T, Error>;
