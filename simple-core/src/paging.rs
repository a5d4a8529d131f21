//! Paging descriptor shared by both condition builders

use serde::{Deserialize, Serialize};

/// Page number (1-indexed) and page size.
///
/// Nothing is clamped: a non-positive value simply disables the clause it
/// drives. `page(0, 10)` has a limit but no offset, `page(1, 0)` has neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paging {
    pub page: i64,
    pub limit: i64,
}

impl Paging {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Limit-only paging, i.e. the first page of `limit` rows.
    pub fn limit_only(limit: i64) -> Self {
        Self::new(1, limit)
    }

    /// Rows to skip, present only when both page and limit are positive.
    /// Saturates at `i64::MAX` for pages past the addressable range.
    pub fn offset(&self) -> Option<i64> {
        if self.page > 0 && self.limit > 0 {
            Some((self.page - 1).saturating_mul(self.limit))
        } else {
            None
        }
    }

    /// Page size, present only when positive.
    pub fn limit(&self) -> Option<i64> {
        (self.limit > 0).then_some(self.limit)
    }

    /// Offset that is worth emitting: `OFFSET 0` / `$skip: 0` are dropped.
    pub fn skip(&self) -> Option<i64> {
        self.offset().filter(|offset| *offset > 0)
    }
}
