//! Page-number pagination.

use serde::{Deserialize, Serialize};

/// `?page=` query parameter (1-based).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Clamp `page` into `1..=last_page(per_page)`.
    pub fn new(page: Option<i64>, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        Self {
            page: page.unwrap_or(1).clamp(1, Self::last_page(per_page)),
            per_page,
        }
    }

    /// Highest page whose row range and successor page number fit in `i64`.
    pub fn last_page(per_page: i64) -> i64 {
        ((i64::MAX - 1) / per_page.max(1)).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    /// Rows to fetch: one extra row tells whether a next page exists.
    pub fn fetch_limit(&self) -> i64 {
        self.per_page.saturating_add(1)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

impl<T> Page<T> {
    /// Build a page from rows fetched with `PageRequest::fetch_limit`.
    pub fn from_overfetch(mut rows: Vec<T>, request: PageRequest) -> Self {
        let has_next = rows.len() as i64 > request.per_page;
        rows.truncate(request.per_page as usize);
        Self {
            items: rows,
            page: request.page,
            next_page: has_next.then_some(request.page + 1),
            prev_page: (request.page > 1).then_some(request.page - 1),
        }
    }

    /// Build a page when the total number of rows is known.
    pub fn from_total(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let seen = (request.page * request.per_page) as u64;
        Self {
            items,
            page: request.page,
            next_page: (total > seen).then_some(request.page + 1),
            prev_page: (request.page > 1).then_some(request.page - 1),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            next_page: self.next_page,
            prev_page: self.prev_page,
        }
    }
}
