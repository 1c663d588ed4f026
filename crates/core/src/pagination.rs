//! Pagination rules shared by every listing operation.

use crate::error::CoreError;

/// Page size used when the client does not send `limit`.
pub const DEFAULT_PAGE_LIMIT: i64 = 5;

/// Largest page size the server hands out; bigger requests are clamped.
pub const MAX_PAGE_LIMIT: i64 = 50;

/// A validated `LIMIT`/`OFFSET` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Slice an already-ordered sequence down to this page.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(0))
            .collect()
    }
}

/// Server-side page size policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePolicy {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PagePolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

impl PagePolicy {
    /// Validate client-supplied pagination parameters.
    ///
    /// - absent `limit` -> `default_limit`; above `max_limit` -> clamped
    /// - zero or negative `limit` -> validation error
    /// - absent `offset` -> 0; negative `offset` -> validation error
    pub fn page(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Page, CoreError> {
        let limit = match limit {
            None => self.default_limit,
            Some(l) if l <= 0 => {
                return Err(CoreError::Validation(format!(
                    "limit must be positive, got {l}"
                )))
            }
            Some(l) => l.min(self.max_limit),
        };
        let offset = match offset {
            None => 0,
            Some(o) if o < 0 => {
                return Err(CoreError::Validation(format!(
                    "offset must not be negative, got {o}"
                )))
            }
            Some(o) => o,
        };
        Ok(Page { limit, offset })
    }
}
