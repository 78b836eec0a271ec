//! Page-based pagination types.

use serde::{Deserialize, Serialize};

/// Default page size when the client does not specify one.
pub const DEFAULT_PER_PAGE: i32 = 50;

/// Maximum page size a client may request.
pub const MAX_PER_PAGE: i32 = 200;

/// Query parameters for paginated list endpoints.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
}

impl PageParams {
    /// Page number, 1-based, never below 1.
    pub fn page(&self) -> i32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PER_PAGE`.
    pub fn per_page(&self) -> i32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// SQL OFFSET for the current page.
    pub fn offset(&self) -> i64 {
        ((self.page() - 1) as i64) * (self.per_page() as i64)
    }

    /// SQL LIMIT for the current page.
    pub fn limit(&self) -> i64 {
        self.per_page() as i64
    }
}

/// Pagination metadata returned alongside page data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: i32,
    pub per_page: i32,
    pub total: i64,
    pub total_pages: i32,
}

impl PageInfo {
    /// Builds pagination metadata from the request params and total row count.
    pub fn new(params: PageParams, total: i64) -> Self {
        let per_page = params.per_page();
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i32;
        Self {
            page: params.page(),
            per_page,
            total,
            total_pages,
        }
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, params: PageParams, total: i64) -> Self {
        Self {
            data,
            pagination: PageInfo::new(params, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams {
            page: Some(-3),
            per_page: Some(10_000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let params = PageParams {
            page: Some(3),
            per_page: Some(25),
        };
        assert_eq!(params.offset(), 50);
        assert_eq!(params.limit(), 25);
    }

    #[test]
    fn test_page_info_total_pages() {
        let params = PageParams {
            page: Some(1),
            per_page: Some(50),
        };
        let info = PageInfo::new(params, 101);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.total, 101);
    }

    #[test]
    fn test_page_info_empty() {
        let info = PageInfo::new(PageParams::default(), 0);
        assert_eq!(info.total_pages, 0);
    }
}
