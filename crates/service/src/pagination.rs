//! Pagination utilities for service layer
//!
//! Callers hand in raw, possibly nonsensical values (`page=0`, `page_size=1000`); services
//! normalize them here before anything reaches a repository.

/// Page size used when the requested one is out of range.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Hard ceiling on rows per page.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination parameters as received from callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: i64,
    /// items per page
    pub per_page: i64,
}

/// Normalized, always valid page request handed to repositories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number, `>= 1`
    pub page: u64,
    /// rows per page, within `1..=MAX_PAGE_SIZE`
    pub per_page: u64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self { Self { page, per_page } }

    /// `page <= 0` becomes 1; a page size outside `1..=100` silently becomes 10.
    pub fn normalize(self) -> PageRequest {
        let page = if self.page <= 0 { 1 } else { self.page as u64 };
        let per_page = match u64::try_from(self.per_page) {
            Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
            _ => DEFAULT_PAGE_SIZE,
        };
        PageRequest { page, per_page }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: DEFAULT_PAGE_SIZE as i64 } }
}

impl PageRequest {
    /// 0-based page index.
    pub fn index(&self) -> u64 { self.page - 1 }

    /// Number of rows to skip, capped at `i64::MAX` (Postgres `BIGINT`).
    pub fn offset(&self) -> u64 { self.index().saturating_mul(self.per_page).min(i64::MAX as u64) }
}
