//! Page-window types shared by every list operation.

use serde::{Deserialize, Serialize};

/// A 1-based page window over an ordered listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, counted from 1.
    #[serde(default = "defaults::page")]
    pub page: u64,
    /// Rows per page, capped at [`PageRequest::MAX_PAGE_SIZE`].
    #[serde(default = "defaults::page_size")]
    pub page_size: u64,
}

impl PageRequest {
    /// Page size applied when the caller leaves it unspecified.
    pub const DEFAULT_PAGE_SIZE: u64 = 25;
    /// Upper bound a caller can request per page.
    pub const MAX_PAGE_SIZE: u64 = 100;

    /// Clamping constructor: page floors at 1, size at the cap.
    pub fn new(page: u64, page_size: u64) -> Self {
        let page = page.max(1);
        let page_size = page_size.clamp(1, Self::MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    /// Rows to skip, the SQL `OFFSET`.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.page_size
    }

    /// Rows to fetch, the SQL `LIMIT`.
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the counts the portal needs for paging UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Rows on this page, already ordered.
    pub items: Vec<T>,
    /// Page number, counted from 1.
    pub page: u64,
    /// Rows per page the window was computed with.
    pub page_size: u64,
    /// Row count across all pages.
    pub total_items: u64,
    /// Page count; at least 1 even when empty.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Wrap one fetched page together with the overall total.
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(request.page_size.max(1))
        };
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages,
        }
    }
}

mod defaults {
    pub fn page() -> u64 {
        1
    }

    pub fn page_size() -> u64 {
        super::PageRequest::DEFAULT_PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_page_and_size() {
        let request = PageRequest::new(0, 5000);
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, PageRequest::MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset_is_zero_based() {
        let request = PageRequest::new(3, 25);
        assert_eq!(request.offset(), 50);
        assert_eq!(request.limit(), 25);
    }

    #[test]
    fn test_response_computes_total_pages() {
        let request = PageRequest::new(1, 10);
        let response = PageResponse::new(vec![1, 2, 3], &request, 31);
        assert_eq!(response.total_pages, 4);

        let empty: PageResponse<i32> = PageResponse::new(Vec::new(), &request, 0);
        assert_eq!(empty.total_pages, 1);
    }

    #[test]
    fn test_serializes_camel_case_for_the_portal() {
        let request = PageRequest::new(1, 10);
        let response = PageResponse::new(vec![1], &request, 1);
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("pageSize").is_some());
        assert!(json.get("totalItems").is_some());
    }
}
