//! Page arithmetic for `GET /questions` and the `Link` header pointing at
//! neighbouring pages.

use std::num::IntErrorKind;

pub const QUESTIONS_PER_PAGE: u32 = 10;

/// 1-based page of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Reads the raw `page` query value; anything that is not a positive integer means page 1.
    /// Pages too large to represent are clamped, they are past the end either way.
    pub fn from_query(page: Option<&str>) -> Self {
        let page = page
            .and_then(|p| match p.trim().parse::<u32>() {
                Ok(p) => Some(p),
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u32::MAX),
                Err(_) => None,
            })
            .filter(|p| *p > 0)
            .unwrap_or(1);
        Self {
            page,
            per_page: QUESTIONS_PER_PAGE,
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn prev_page(&self) -> Option<u32> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next_page(&self, total: i64) -> Option<u32> {
        (i64::from(self.page) * i64::from(self.per_page) < total).then(|| self.page.saturating_add(1))
    }

    /// RFC 8288 `Link` header value for the pages around this one, if any exist.
    pub fn link_header(&self, path: &str, total: i64) -> Option<String> {
        let links: Vec<String> = [("prev", self.prev_page()), ("next", self.next_page(total))]
            .into_iter()
            .filter_map(|(rel, page)| page.map(|p| format!("<{path}?page={p}>; rel=\"{rel}\"")))
            .collect();
        (!links.is_empty()).then(|| links.join(", "))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_query(None)
    }
}
