use serde::Serialize;

/// Default page size for listing endpoints.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 25;

/// Page selection applied to a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Requested page, 1-based.
    pub page: usize,
    /// Number of items per page.
    pub per_page: usize,
}

/// One page of results plus enough metadata to render pagination controls.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: usize, total_pages: usize) -> Self {
        Self {
            items,
            page,
            total_pages,
        }
    }
}
