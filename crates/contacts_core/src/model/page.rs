//! Paging request/response shapes and page-number helpers.

use super::contact::Contact;
use serde::{Deserialize, Serialize};

/// One page request. `page_number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
    /// Optional name/email substring filter; blank means no filter.
    pub search: Option<String>,
}

impl PageRequest {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Trimmed search term, or `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// Items of one page plus the filter-wide match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPage {
    pub items: Vec<Contact>,
    pub total: u64,
}

/// Number of pages needed to show `total` rows; at least 1 so an empty list
/// still renders "page 1 of 1".
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 || total == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamps a requested page into `[1, total_pages(total, page_size)]`.
pub fn clamp_page_number(page_number: u32, total: u64, page_size: u32) -> u32 {
    page_number.clamp(1, total_pages(total, page_size))
}
