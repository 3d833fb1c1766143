use serde::{Deserialize, Serialize};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn from_query(query: &PageQuery) -> Self {
        let page = query.page.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_events: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: Page, total: i64, returned: usize) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + page.limit - 1) / page.limit
        };

        Self {
            current_page: page.page,
            total_pages,
            total_events: total,
            has_next: (page.offset() + returned as i64) < total,
            has_prev: page.page > 1,
        }
    }
}
