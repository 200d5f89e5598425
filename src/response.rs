use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

/// Success envelope shared by every handler.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct PaginationQuery {
    /// 1-based page number
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaginationQuery {
    /// `(page, per_page)` with page >= 1 and per_page in 1..=100.
    pub fn resolve(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }
}

/// Rows to skip for a 1-based page. Saturates instead of overflowing on
/// absurd page numbers, which then simply return an empty page.
pub fn page_offset(page: u64, per_page: u64) -> usize {
    let offset = page.saturating_sub(1).saturating_mul(per_page);
    usize::try_from(offset).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PaginatedResponse::<String>::new(vec![], 100, 1, 20).total_pages, 5);
        assert_eq!(PaginatedResponse::<String>::new(vec![], 101, 1, 20).total_pages, 6);
        assert_eq!(PaginatedResponse::<String>::new(vec![], 1, 1, 20).total_pages, 1);
    }

    #[test]
    fn total_pages_handles_zero() {
        assert_eq!(PaginatedResponse::<String>::new(vec![], 10, 1, 0).total_pages, 0);
        assert_eq!(PaginatedResponse::<String>::new(vec![], 0, 1, 20).total_pages, 0);
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(PaginationQuery::default().resolve(), (1, 20));
        let query = PaginationQuery {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(query.resolve(), (1, 100));
        let query = PaginationQuery {
            page: Some(3),
            per_page: Some(0),
        };
        assert_eq!(query.resolve(), (3, 1));
    }

    #[test]
    fn page_offset_saturates_on_huge_pages() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        assert_eq!(page_offset(u64::MAX, 100), usize::MAX);
    }
}
