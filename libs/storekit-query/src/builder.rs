//! Fluent query builder
//!
//! Collects filters, sort keys and a pagination window, then validates all of
//! it in [`QueryBuilder::build`] against the configured [`QueryLimits`].
//!
//! # Example
//!
//! ```rust
//! use storekit_query::{QueryBuilder, SortDir};
//!
//! let query = QueryBuilder::new()
//!     .filter("status", "active")
//!     .one_of("region", ["eu", "us"])
//!     .order_by("fullname", SortDir::Asc)
//!     .page(2, 20)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(query.pagination().offset(), 20);
//! ```

use crate::descriptor::{Filter, Pagination, QueryDescriptor, SortKey};
use crate::limits::QueryLimits;
use crate::value::Value;
use crate::{Error, SortDir};

#[derive(Clone, Debug, Default)]
#[must_use]
pub struct QueryBuilder {
    limits: QueryLimits,
    filters: Vec<Filter>,
    sorting: Vec<SortKey>,
    limit: Option<i64>,
    offset: Option<i64>,
    page: Option<(i64, i64)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate against custom limits instead of [`QueryLimits::default`].
    pub fn limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Add an equality filter. `Value::Null` matches absent or null values.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(field, value));
        self
    }

    /// Add a membership filter: `field` is one of `values`.
    pub fn one_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::one_of(field, values));
        self
    }

    /// Append a prepared filter as-is.
    pub fn push_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a sort key. Keys apply in insertion order.
    pub fn order_by(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.sorting.push(SortKey::new(field, dir));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Page-based window. Cannot be combined with `limit`/`offset`.
    pub fn page(mut self, page: i64, size: i64) -> Self {
        self.page = Some((page, size));
        self
    }

    /// Validate and produce the descriptor.
    ///
    /// # Errors
    /// - `TooManySortFields` when more sort keys than allowed were added
    /// - `ConflictingPagination` when both `limit/offset` and `page` were set
    /// - the bounds errors of [`Pagination::new`] / [`Pagination::from_page`]
    pub fn build(self) -> Result<QueryDescriptor, Error> {
        self.limits.validate_sort_count(self.sorting.len())?;

        let pagination = match (self.page, self.limit.is_some() || self.offset.is_some()) {
            (Some(_), true) => return Err(Error::ConflictingPagination),
            (Some((page, size)), false) => Pagination::from_page(page, size, &self.limits)?,
            (None, _) => {
                let default_limit = i64::try_from(self.limits.default_limit).unwrap_or(i64::MAX);
                Pagination::new(
                    self.limit.unwrap_or(default_limit),
                    self.offset.unwrap_or(0),
                    &self.limits,
                )?
            }
        };

        Ok(QueryDescriptor {
            filters: self.filters,
            sorting: self.sorting,
            pagination,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::Operand;

    #[test]
    fn test_empty_query() {
        let query = QueryBuilder::new().build().unwrap();
        assert!(query.filters().is_empty());
        assert!(query.sorting().is_empty());
        assert_eq!(query.pagination(), Pagination::default());
    }

    #[test]
    fn test_filters_keep_order() {
        let query = QueryBuilder::new()
            .filter("status", "active")
            .one_of("id", [3_i64, 1, 2])
            .filter("deleted_at", Value::Null)
            .build()
            .unwrap();

        let fields: Vec<_> = query.filters().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, ["status", "id", "deleted_at"]);
        assert_eq!(
            query.filters()[1].operand,
            Operand::In(vec![Value::Int(3), Value::Int(1), Value::Int(2)])
        );
        assert_eq!(query.filters()[2].operand, Operand::Eq(Value::Null));
    }

    #[test]
    fn test_order_by_multiple() {
        let query = QueryBuilder::new()
            .order_by("status", SortDir::Asc)
            .order_by("created_at", SortDir::Desc)
            .build()
            .unwrap();

        assert_eq!(
            query.sorting(),
            &[
                SortKey::new("status", SortDir::Asc),
                SortKey::new("created_at", SortDir::Desc)
            ]
        );
    }

    #[test]
    fn test_too_many_sort_fields() {
        let builder = (0..6).fold(QueryBuilder::new(), |b, i| {
            b.order_by(format!("f{i}"), SortDir::Asc)
        });
        assert_eq!(
            builder.build(),
            Err(Error::TooManySortFields { got: 6, max: 5 })
        );
    }

    #[test]
    fn test_limit_offset() {
        let query = QueryBuilder::new().limit(2).offset(2).build().unwrap();
        assert_eq!(query.pagination().limit(), 2);
        assert_eq!(query.pagination().offset(), 2);
    }

    #[test]
    fn test_offset_only_uses_default_limit() {
        let query = QueryBuilder::new().offset(30).build().unwrap();
        assert_eq!(query.pagination().limit(), 10);
        assert_eq!(query.pagination().offset(), 30);
    }

    #[test]
    fn test_custom_default_limit() {
        let query = QueryBuilder::new()
            .limits(QueryLimits::new().with_default_limit(25))
            .build()
            .unwrap();
        assert_eq!(query.pagination().limit(), 25);
    }

    #[test]
    fn test_page() {
        let query = QueryBuilder::new().page(2, 20).build().unwrap();
        assert_eq!(query.pagination().limit(), 20);
        assert_eq!(query.pagination().offset(), 20);
    }

    #[test]
    fn test_page_with_limit_conflicts() {
        let err = QueryBuilder::new().page(1, 10).limit(5).build();
        assert_eq!(err, Err(Error::ConflictingPagination));

        let err = QueryBuilder::new().offset(0).page(1, 10).build();
        assert_eq!(err, Err(Error::ConflictingPagination));
    }

    #[test]
    fn test_invalid_limit() {
        assert!(matches!(
            QueryBuilder::new().limit(0).build(),
            Err(Error::InvalidLimit { got: 0, .. })
        ));
        assert!(matches!(
            QueryBuilder::new().limit(-5).build(),
            Err(Error::InvalidLimit { got: -5, .. })
        ));
    }
}
