//! JSON-shaped search request.
//!
//! ```json
//! {
//!   "filters":    [{ "field": "status", "value": ["active", "pending"] }],
//!   "sorting":    [{ "field": "fullname", "type": "desc" }],
//!   "pagination": { "limit": 20, "offset": 40 }
//! }
//! ```
//!
//! `pagination` may instead be `{ "page": 3, "size": 20 }`. Every part is
//! optional.

use serde::{Deserialize, Serialize};

use crate::builder::QueryBuilder;
use crate::descriptor::{Filter, Operand, QueryDescriptor};
use crate::limits::QueryLimits;
use crate::value::Value;
use crate::{Error, SortDir};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawQuery {
    #[serde(default)]
    pub filters: Vec<RawFilter>,
    #[serde(default)]
    pub sorting: Vec<RawSort>,
    #[serde(default)]
    pub pagination: Option<RawPagination>,
}

/// A scalar means equality, a list of scalars means membership.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawFilter {
    pub field: String,
    pub value: serde_json::Value,
}

/// Direction defaults to `asc` when `type` is absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawSort {
    pub field: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawPagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl RawFilter {
    fn into_filter(self) -> Result<Filter, Error> {
        let operand = match &self.value {
            serde_json::Value::Array(items) => Operand::In(
                items
                    .iter()
                    .map(|v| Value::from_json(&self.field, v))
                    .collect::<Result<_, _>>()?,
            ),
            scalar => Operand::Eq(Value::from_json(&self.field, scalar)?),
        };
        Ok(Filter {
            field: self.field,
            operand,
        })
    }
}

impl RawQuery {
    /// Parse a JSON request body.
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Validate and normalize into a [`QueryDescriptor`].
    ///
    /// # Errors
    /// - `InvalidFilterValue` for nested objects or nested lists
    /// - `InvalidSortDirection` for anything but `asc` / `desc`
    /// - `ConflictingPagination` when `limit/offset` and `page/size` are mixed
    /// - the bounds errors of [`QueryBuilder::build`]
    pub fn into_descriptor(self, limits: &QueryLimits) -> Result<QueryDescriptor, Error> {
        let mut builder = QueryBuilder::new().limits(limits.clone());

        for raw in self.filters {
            builder = builder.push_filter(raw.into_filter()?);
        }

        for raw in self.sorting {
            let dir = match raw.direction.as_deref() {
                None => SortDir::Asc,
                Some(d) => d.parse()?,
            };
            builder = builder.order_by(raw.field, dir);
        }

        if let Some(p) = self.pagination {
            let by_window = p.limit.is_some() || p.offset.is_some();
            let by_page = p.page.is_some() || p.size.is_some();
            if by_window && by_page {
                return Err(Error::ConflictingPagination);
            }
            if by_page {
                let default_size = i64::try_from(limits.default_limit).unwrap_or(i64::MAX);
                builder = builder.page(p.page.unwrap_or(1), p.size.unwrap_or(default_size));
            } else {
                if let Some(limit) = p.limit {
                    builder = builder.limit(limit);
                }
                if let Some(offset) = p.offset {
                    builder = builder.offset(offset);
                }
            }
        }

        builder.build()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::SortKey;

    fn parse(json: &str) -> Result<QueryDescriptor, Error> {
        RawQuery::from_json(json)
            .unwrap()
            .into_descriptor(&QueryLimits::default())
    }

    #[test]
    fn test_empty_body() {
        let q = parse("{}").unwrap();
        assert_eq!(q, QueryDescriptor::default());
    }

    #[test]
    fn test_full_request() {
        let q = parse(
            r#"{
                "filters": [
                    {"field": "status", "value": ["active", "pending"]},
                    {"field": "age", "value": 30}
                ],
                "sorting": [{"field": "fullname", "type": "desc"}, {"field": "id"}],
                "pagination": {"limit": 2, "offset": 4}
            }"#,
        )
        .unwrap();

        assert_eq!(
            q.filters()[0].operand,
            Operand::In(vec![Value::from("active"), Value::from("pending")])
        );
        assert_eq!(q.filters()[1].operand, Operand::Eq(Value::Int(30)));
        assert_eq!(
            q.sorting(),
            &[
                SortKey::new("fullname", SortDir::Desc),
                SortKey::new("id", SortDir::Asc)
            ]
        );
        assert_eq!(q.pagination().limit(), 2);
        assert_eq!(q.pagination().offset(), 4);
    }

    #[test]
    fn test_page_size_normalizes() {
        let q = parse(r#"{"pagination": {"page": 3, "size": 20}}"#).unwrap();
        assert_eq!(q.pagination().limit(), 20);
        assert_eq!(q.pagination().offset(), 40);
    }

    #[test]
    fn test_page_without_size_uses_default_size() {
        let q = parse(r#"{"pagination": {"page": 2}}"#).unwrap();
        assert_eq!(q.pagination().limit(), 10);
        assert_eq!(q.pagination().offset(), 10);
    }

    #[test]
    fn test_mixed_pagination_rejected() {
        let err = parse(r#"{"pagination": {"limit": 10, "page": 1}}"#).unwrap_err();
        assert_eq!(err, Error::ConflictingPagination);
    }

    #[test]
    fn test_unknown_direction_rejected() {
        let err = parse(r#"{"sorting": [{"field": "id", "type": "up"}]}"#).unwrap_err();
        assert_eq!(err, Error::InvalidSortDirection("up".to_owned()));
    }

    #[test]
    fn test_nested_object_rejected() {
        let err = parse(r#"{"filters": [{"field": "status", "value": {"$ne": 1}}]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterValue { .. }));

        let err = parse(r#"{"filters": [{"field": "status", "value": [[1]]}]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterValue { .. }));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(matches!(
            parse(r#"{"pagination": {"limit": 101}}"#),
            Err(Error::InvalidLimit { got: 101, .. })
        ));
        assert!(matches!(
            parse(r#"{"pagination": {"offset": -1}}"#),
            Err(Error::InvalidOffset(-1))
        ));
        assert!(matches!(
            parse(r#"{"pagination": {"page": 0, "size": 10}}"#),
            Err(Error::InvalidPage { .. })
        ));
    }
}
