use serde::{Deserialize, Serialize};

use crate::descriptor::Pagination;

/// One window of results plus the total match count.
///
/// `total` comes from a separate count query, so it can disagree with `items`
/// when writes land in between.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit(),
            offset: pagination.offset(),
        }
    }

    /// Map items while preserving the window.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }

    /// Fallible [`Page::map`].
    ///
    /// # Errors
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        })
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as u64) < self.total
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::QueryLimits;

    #[test]
    fn test_map_keeps_window() {
        let p = Page::new(vec![1, 2], 5, Pagination::new(2, 2, &QueryLimits::default()).unwrap());
        let mapped = p.map(|x| x * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.total, 5);
        assert_eq!(mapped.limit, 2);
        assert_eq!(mapped.offset, 2);
        assert!(mapped.has_more());
    }

    #[test]
    fn test_try_map_stops_on_error() {
        let p = Page::new(vec![1, 2, 3], 3, Pagination::default());
        let res: Result<Page<i32>, &str> = p.try_map(|x| if x == 2 { Err("bad") } else { Ok(x) });
        assert_eq!(res, Err("bad"));
    }

    #[test]
    fn test_last_page_has_no_more() {
        let p = Page::new(vec!["c"], 3, Pagination::new(2, 2, &QueryLimits::default()).unwrap());
        assert!(!p.has_more());
    }
}
