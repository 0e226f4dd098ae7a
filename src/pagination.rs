use serde::Serialize;

/// Page request applied to activity listings. Defaults match the finder
/// layer: first page of 25.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, page_size: 25 }
    }
}

impl Pagination {
    /// Clamps page and pageSize to at least 1.
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Metadata attached to a paged listing, including totals computed from a
/// count query scoped to the same schedule.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total_items: i64) -> Self {
        Self {
            current_page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages: (total_items + pagination.page_size - 1) / pagination.page_size,
        }
    }
}
