//! Input validation caps for query descriptors
//!
//! These bound the work a single request can ask for:
//! - Maximum `limit` (and page size)
//! - Maximum page number for page-based input
//! - Maximum number of sort keys

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLimits {
    /// Maximum `limit` / page size (default: 100)
    pub max_limit: u64,
    /// `limit` used when the caller gives none (default: 10)
    pub default_limit: u64,
    /// Maximum page number for `page/size` input (default: 1000)
    pub max_page: u64,
    /// Maximum number of sort keys (default: 5)
    pub max_sort_fields: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_limit: Self::MAX_LIMIT,
            default_limit: Self::DEFAULT_LIMIT,
            max_page: Self::MAX_PAGE,
            max_sort_fields: Self::MAX_SORT_FIELDS,
        }
    }
}

impl QueryLimits {
    pub const MAX_LIMIT: u64 = 100;
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const MAX_PAGE: u64 = 1000;
    pub const MAX_SORT_FIELDS: usize = 5;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum `limit` value
    #[must_use]
    pub fn with_max_limit(mut self, max: u64) -> Self {
        self.max_limit = max;
        self
    }

    /// Set the `limit` applied when none is requested
    #[must_use]
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set maximum page number
    #[must_use]
    pub fn with_max_page(mut self, max: u64) -> Self {
        self.max_page = max;
        self
    }

    /// Set maximum number of sort keys
    #[must_use]
    pub fn with_max_sort_fields(mut self, max: usize) -> Self {
        self.max_sort_fields = max;
        self
    }

    /// Validate number of sort keys
    ///
    /// # Errors
    /// `Error::TooManySortFields` when `count` exceeds the cap.
    pub fn validate_sort_count(&self, count: usize) -> Result<(), Error> {
        if count > self.max_sort_fields {
            return Err(Error::TooManySortFields {
                got: count,
                max: self.max_sort_fields,
            });
        }
        Ok(())
    }
}
