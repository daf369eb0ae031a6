//! Page-boundary computation for the assembled result set.

use crate::error::LookupError;
use serde::{Deserialize, Serialize};

///
/// Paginator
///
/// Pure arithmetic over a known result count; row fetching happens
/// elsewhere. Page numbers are 1-based.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    #[must_use]
    pub const fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: if per_page == 0 { 1 } else { per_page },
        }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Total pages; an empty result still has one (empty) page.
    #[must_use]
    pub const fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Row bounds (`start..end` offsets) for a page number.
    pub fn page(&self, number: u64) -> Result<PageBounds, LookupError> {
        if number < 1 || number > self.num_pages() {
            return Err(LookupError::InvalidPage {
                page: number.to_string(),
                pages: self.num_pages(),
            });
        }

        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(self.count);

        Ok(PageBounds { number, start, end })
    }
}

///
/// PageBounds
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageBounds {
    pub number: u64,
    /// First row offset on the page (0-based, inclusive).
    pub start: u64,
    /// One past the last row offset on the page.
    pub end: u64,
}

///
/// PageInfo
///
/// Pagination metadata handed to the presentation layer.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PageInfo {
    pub number: u64,
    pub per_page: u64,
    pub total_pages: u64,
    /// Count of rows matching the assembled query.
    pub result_count: u64,
    /// Unfiltered table count; absent when the embedding configuration
    /// declared it too expensive to compute.
    pub full_count: Option<u64>,
    /// True when `full_count` was skipped for cost reasons.
    pub count_truncated: bool,
    /// True when the whole result set is being shown on one page.
    pub show_all: bool,
    /// True when the result is small enough for the show-all escape hatch.
    pub can_show_all: bool,
    pub multi_page: bool,
    pub bounds: PageBounds,
}
