//! Pagination for list endpoints

use serde::Serialize;

/// Rows per page on every list endpoint
pub const PAGE_SIZE: i64 = 100;

/// Page metadata returned alongside list results
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pagination {
    /// Current page, 1-indexed
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total_results: i64,
    pub next_page: Option<i64>,
    pub previous_page: Option<i64>,
    #[serde(skip)]
    pub offset: i64,
}

impl Pagination {
    /// Page metadata for `total_results` rows, with `requested_page` pulled
    /// back onto the first or last page when it falls outside the result set.
    ///
    /// ```
    /// use blossom_api::pagination::Pagination;
    ///
    /// let p = Pagination::for_page(250, 99);
    /// assert_eq!(p.page, 3);
    /// assert_eq!(p.offset, 200);
    /// assert_eq!(p.next_page, None);
    /// ```
    pub fn for_page(total_results: i64, requested_page: i64) -> Self {
        let total_pages = match total_results {
            n if n <= 0 => 0,
            n => (n - 1) / PAGE_SIZE + 1,
        };
        // An empty result set still has a page 1
        let page = requested_page.clamp(1, total_pages.max(1));

        Self {
            page,
            page_size: PAGE_SIZE,
            total_pages,
            total_results,
            next_page: (page < total_pages).then_some(page + 1),
            previous_page: (page > 1).then_some(page - 1),
            offset: PAGE_SIZE * (page - 1),
        }
    }
}
