//! Page slicing and the compact pager.
//!
//! Pages are 1-based. An empty result is still "page 1 of 1".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pages shown in full before the pager starts collapsing into ellipses
const MAX_PLAIN_PAGES: usize = 7;

/// The fixed set of page sizes offered by the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    Ten,
    #[default]
    TwentyFive,
    Fifty,
    Hundred,
    FiveHundred,
}

impl PageSize {
    pub const ALL: [PageSize; 5] = [
        PageSize::Ten,
        PageSize::TwentyFive,
        PageSize::Fifty,
        PageSize::Hundred,
        PageSize::FiveHundred,
    ];

    pub fn rows(self) -> usize {
        match self {
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
            PageSize::FiveHundred => 500,
        }
    }

    pub fn from_rows(rows: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.rows() == rows)
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(rows: usize) -> Result<Self, Self::Error> {
        Self::from_rows(rows).ok_or_else(|| {
            format!(
                "unsupported page size {} (expected one of 10, 25, 50, 100, 500)",
                rows
            )
        })
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> usize {
        size.rows()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rows())
    }
}

/// `ceil(row_count / page_size)`, never less than 1
pub fn total_pages(row_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    row_count.div_ceil(page_size).max(1)
}

/// End-exclusive slice `[(page-1)*size, page*size)` clamped to the input.
/// A page past the end yields an empty slice.
pub fn paginate<T>(rows: &[T], page_size: usize, current_page: usize) -> &[T] {
    let start = current_page
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(rows.len());
    let end = start.saturating_add(page_size).min(rows.len());
    &rows[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Page links for the compact pager.
///
/// Up to seven pages are listed in full. Beyond that the first and last
/// pages are always shown, with the current page and its neighbours in
/// between and an ellipsis for each collapsed run.
pub fn page_numbers(total_pages: usize, current_page: usize) -> Vec<PageItem> {
    if total_pages <= MAX_PLAIN_PAGES {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    let mut items = vec![PageItem::Page(1)];
    if current_page > 3 {
        items.push(PageItem::Ellipsis);
    }

    let start = current_page.saturating_sub(1).max(2);
    let end = current_page.saturating_add(1).min(total_pages - 1);
    items.extend((start..=end).map(PageItem::Page));

    if current_page.saturating_add(2) < total_pages {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total_pages));
    items
}

/// Page size and 1-based current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    page_size: PageSize,
    current_page: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl PageState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            current_page: 1,
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page.max(1)
    }

    /// Changing the page size always returns to page 1
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    pub fn total_pages(&self, row_count: usize) -> usize {
        total_pages(row_count, self.page_size.rows())
    }

    pub fn next(&mut self, row_count: usize) {
        self.current_page = (self.current_page() + 1).min(self.total_pages(row_count));
    }

    pub fn previous(&mut self) {
        self.current_page = self.current_page().saturating_sub(1).max(1);
    }

    pub fn go_to(&mut self, page: usize, row_count: usize) {
        self.current_page = page.clamp(1, self.total_pages(row_count));
    }

    pub fn has_next(&self, row_count: usize) -> bool {
        self.current_page() < self.total_pages(row_count)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page() > 1
    }

    /// Pull an out-of-range page back into `[1, total_pages]`.
    /// Returns true if the page had to move.
    pub fn clamp(&mut self, row_count: usize) -> bool {
        let clamped = self.current_page.clamp(1, self.total_pages(row_count));
        let moved = clamped != self.current_page;
        self.current_page = clamped;
        moved
    }

    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        paginate(rows, self.page_size.rows(), self.current_page())
    }
}

/// Footer summary for the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// 1-based position of the first row on the page (0 when empty)
    pub first: usize,
    /// 1-based position of the last row on the page
    pub last: usize,
    pub total_filtered: usize,
    pub total_unfiltered: usize,
    pub total_pages: usize,
}

impl PageRange {
    pub fn new(state: &PageState, total_filtered: usize, total_unfiltered: usize) -> Self {
        let size = state.page_size().rows();
        let page = state.current_page();
        let start = (page - 1) * size;
        let (first, last) = if start >= total_filtered {
            (0, 0)
        } else {
            (start + 1, (page * size).min(total_filtered))
        };
        Self {
            first,
            last,
            total_filtered,
            total_unfiltered,
            total_pages: state.total_pages(total_filtered),
        }
    }

    /// The pager footer is hidden when everything fits on one page
    pub fn show_pager(&self) -> bool {
        self.total_pages > 1
    }

    pub fn label(&self) -> String {
        let mut label = format!(
            "Showing {} to {} of {} rows",
            self.first, self.last, self.total_filtered
        );
        if self.total_filtered < self.total_unfiltered {
            label.push_str(&format!(" (filtered from {})", self.total_unfiltered));
        }
        label
    }
}
