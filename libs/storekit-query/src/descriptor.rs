//! The validated query descriptor and its parts.

use std::borrow::Cow;

use crate::limits::QueryLimits;
use crate::value::Value;
use crate::{Error, SortDir};

/// Sort field applied when a descriptor carries no explicit sorting.
pub const DEFAULT_SORT_FIELD: &str = "created_at";

/// Right-hand side of a filter: a single value (equality) or a list
/// (membership).
///
/// The type parameter lets adapters carry the same shape after coercing
/// [`Value`]s into their native representation.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand<V = Value> {
    Eq(V),
    In(Vec<V>),
}

impl<V> Operand<V> {
    /// Convert every value, short-circuiting on the first failure.
    ///
    /// # Errors
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&V) -> Result<U, E>) -> Result<Operand<U>, E> {
        Ok(match self {
            Operand::Eq(v) => Operand::Eq(f(v)?),
            Operand::In(vs) => Operand::In(vs.iter().map(f).collect::<Result<_, _>>()?),
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        let slice = match self {
            Operand::Eq(v) => std::slice::from_ref(v),
            Operand::In(vs) => vs.as_slice(),
        };
        slice.iter()
    }
}

/// `field == value` or `field IN values`.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operand: Operand,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operand: Operand::Eq(value.into()),
        }
    }

    pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            field: field.into(),
            operand: Operand::In(values.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

impl SortKey {
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }
}

/// A validated `limit/offset` window.
///
/// Fields are private so every instance has passed the bounds checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    limit: u64,
    offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: QueryLimits::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// # Errors
    /// `InvalidLimit` when `limit` is outside `[1, max_limit]`,
    /// `InvalidOffset` when `offset` is negative.
    pub fn new(limit: i64, offset: i64, limits: &QueryLimits) -> Result<Self, Error> {
        let limit = u64::try_from(limit)
            .ok()
            .filter(|l| (1..=limits.max_limit).contains(l))
            .ok_or(Error::InvalidLimit {
                got: limit,
                max: limits.max_limit,
            })?;
        let offset = u64::try_from(offset).map_err(|_| Error::InvalidOffset(offset))?;
        Ok(Self { limit, offset })
    }

    /// Page-based window: `limit = size`, `offset = (page - 1) * size`.
    ///
    /// # Errors
    /// `InvalidPage` when `page` is outside `[1, max_page]`,
    /// `InvalidPageSize` when `size` is outside `[1, max_limit]`.
    pub fn from_page(page: i64, size: i64, limits: &QueryLimits) -> Result<Self, Error> {
        let page = u64::try_from(page)
            .ok()
            .filter(|p| (1..=limits.max_page).contains(p))
            .ok_or(Error::InvalidPage {
                got: page,
                max: limits.max_page,
            })?;
        let size = u64::try_from(size)
            .ok()
            .filter(|s| (1..=limits.max_limit).contains(s))
            .ok_or(Error::InvalidPageSize {
                got: size,
                max: limits.max_limit,
            })?;
        Ok(Self {
            limit: size,
            offset: (page - 1) * size,
        })
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Normalized "what rows to fetch" request.
///
/// Built through [`crate::QueryBuilder`] or [`crate::RawQuery`]; both apply the
/// same [`QueryLimits`] checks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryDescriptor {
    pub(crate) filters: Vec<Filter>,
    pub(crate) sorting: Vec<SortKey>,
    pub(crate) pagination: Pagination,
}

impl QueryDescriptor {
    #[must_use]
    pub fn builder() -> crate::QueryBuilder {
        crate::QueryBuilder::new()
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Sorting exactly as requested (possibly empty).
    #[must_use]
    pub fn sorting(&self) -> &[SortKey] {
        &self.sorting
    }

    /// Sorting to apply: the requested keys, or `created_at asc` when none
    /// were given.
    #[must_use]
    pub fn effective_sorting(&self) -> Cow<'_, [SortKey]> {
        if self.sorting.is_empty() {
            Cow::Owned(vec![SortKey::new(DEFAULT_SORT_FIELD, SortDir::Asc)])
        } else {
            Cow::Borrowed(&self.sorting)
        }
    }

    #[must_use]
    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Check every filter and sort field against a model's allow-list.
    ///
    /// # Errors
    /// `Error::UnknownField` naming the first field rejected by `is_known`.
    pub fn ensure_known_fields(&self, is_known: impl Fn(&str) -> bool) -> Result<(), Error> {
        let fields = self
            .filters
            .iter()
            .map(|f| f.field.as_str())
            .chain(self.sorting.iter().map(|s| s.field.as_str()));
        for field in fields {
            if !is_known(field) {
                return Err(Error::UnknownField(field.to_owned()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_pagination() {
        let p = Pagination::default();
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_bounds() {
        let limits = QueryLimits::default();
        assert!(Pagination::new(1, 0, &limits).is_ok());
        assert!(Pagination::new(100, 0, &limits).is_ok());
        assert_eq!(
            Pagination::new(0, 0, &limits),
            Err(Error::InvalidLimit { got: 0, max: 100 })
        );
        assert_eq!(
            Pagination::new(101, 0, &limits),
            Err(Error::InvalidLimit { got: 101, max: 100 })
        );
        assert_eq!(
            Pagination::new(10, -1, &limits),
            Err(Error::InvalidOffset(-1))
        );
    }

    #[test]
    fn test_page_normalizes_to_limit_offset() {
        let limits = QueryLimits::default();
        let p = Pagination::from_page(3, 20, &limits).unwrap();
        assert_eq!(p.limit(), 20);
        assert_eq!(p.offset(), 40);

        let first = Pagination::from_page(1, 5, &limits).unwrap();
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_page_bounds() {
        let limits = QueryLimits::default();
        assert!(matches!(
            Pagination::from_page(0, 10, &limits),
            Err(Error::InvalidPage { got: 0, .. })
        ));
        assert!(matches!(
            Pagination::from_page(1001, 10, &limits),
            Err(Error::InvalidPage { .. })
        ));
        assert!(matches!(
            Pagination::from_page(1, 0, &limits),
            Err(Error::InvalidPageSize { .. })
        ));
        assert!(matches!(
            Pagination::from_page(1, 101, &limits),
            Err(Error::InvalidPageSize { .. })
        ));
    }

    #[test]
    fn test_effective_sorting_defaults_to_created_at() {
        let q = QueryDescriptor::default();
        assert!(q.sorting().is_empty());
        assert_eq!(
            q.effective_sorting().as_ref(),
            &[SortKey::new(DEFAULT_SORT_FIELD, SortDir::Asc)]
        );
    }

    #[test]
    fn test_ensure_known_fields() {
        let q = QueryDescriptor {
            filters: vec![Filter::eq("status", "active")],
            sorting: vec![SortKey::new("nickname", SortDir::Desc)],
            pagination: Pagination::default(),
        };
        let known = |f: &str| matches!(f, "status" | "fullname");
        assert_eq!(
            q.ensure_known_fields(known),
            Err(Error::UnknownField("nickname".to_owned()))
        );
        assert!(q.ensure_known_fields(|_| true).is_ok());
    }

    #[test]
    fn test_operand_try_map() {
        let op = Operand::In(vec![Value::Int(1), Value::Int(2)]);
        let mapped: Operand<i64> = op
            .try_map(|v| match v {
                Value::Int(i) => Ok(*i * 10),
                _ => Err("not an int"),
            })
            .unwrap();
        assert_eq!(mapped, Operand::In(vec![10, 20]));

        let bad = Operand::Eq(Value::Bool(true));
        assert_eq!(
            bad.try_map(|v| match v {
                Value::Int(i) => Ok(*i),
                _ => Err("not an int"),
            }),
            Err("not an int")
        );
    }

    #[test]
    fn test_operand_values() {
        let eq = Operand::Eq(1);
        assert_eq!(eq.values().copied().collect::<Vec<_>>(), vec![1]);
        let list = Operand::In(vec![1, 2, 3]);
        assert_eq!(list.values().count(), 3);
    }
}
