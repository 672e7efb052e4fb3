use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: usize = 10;

/// 1-based page position over `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            total: 0,
        }
    }
}

impl Pagination {
    /// Normalizes `per_page == 0` to the default and clamps `page` into range.
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        let per_page = if per_page == 0 {
            DEFAULT_PER_PAGE
        } else {
            per_page
        };
        Self {
            page,
            per_page,
            total,
        }
        .clamp()
    }

    /// At least one page, even when there are no items.
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1)).max(1)
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn clamp(self) -> Self {
        Self {
            page: self.page.clamp(1, self.total_pages()),
            ..self
        }
    }

    pub fn next_page(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
        .clamp()
    }

    pub fn previous_page(self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            ..self
        }
        .clamp()
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = (start + self.per_page).min(items.len());
        &items[start..end]
    }

    /// e.g. `"21-30 of 95"`, or `"0 of 0"` when empty.
    pub fn range_label(&self) -> String {
        if self.total == 0 {
            return "0 of 0".to_string();
        }
        let first = self.offset() + 1;
        let last = (self.offset() + self.per_page).min(self.total);
        format!("{}-{} of {}", first, last, self.total)
    }
}
