use std::sync::Arc;
use tracing::debug;

use crate::config::config::GridConfig;
use crate::data::column_filter::{apply_filters, FilterState};
use crate::data::column_visibility::ColumnVisibility;
use crate::data::pagination::{page_numbers, PageItem, PageRange, PageSize, PageState};
use crate::data::result_set::{ResultSet, Row};
use crate::data::row_sorter::{apply_sort, SortState};
use crate::data::virtualizer::{RenderPlan, VirtualizerConfig};
use crate::utils::format::format_with_commas;

/// A view over a ResultSet that filters, sorts, pages and projects columns
/// without modifying the underlying data.
///
/// Stage outputs are cached as row indices and only recomputed when their
/// own inputs change: a filter edit refilters and resorts, a sort change
/// only resorts, and page navigation touches neither.
#[derive(Debug, Clone)]
pub struct GridView {
    /// The underlying immutable result
    source: Arc<ResultSet>,

    filters: FilterState,
    sort: SortState,
    visibility: ColumnVisibility,
    page: PageState,

    /// Source row indices passing the filters, in source order
    filtered_rows: Vec<usize>,
    /// `filtered_rows` after sorting
    sorted_rows: Vec<usize>,

    settings: GridConfig,
}

/// Everything needed to draw the current page
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub columns: Vec<String>,
    /// Rows of the rendered window, paired with their index within the page
    pub rows: Vec<(usize, &'a Row)>,
    pub plan: RenderPlan,
    pub range: PageRange,
    pub pager: Vec<PageItem>,
    pub current_page: usize,
    pub empty_message: Option<&'static str>,
}

impl GridView {
    /// Create a view showing all rows of `source` with default grid settings
    pub fn new(source: Arc<ResultSet>) -> Self {
        Self::with_settings(source, GridConfig::default())
    }

    pub fn with_settings(source: Arc<ResultSet>, settings: GridConfig) -> Self {
        let row_count = source.rows.len();
        Self {
            source,
            filters: FilterState::new(),
            sort: SortState::none(),
            visibility: ColumnVisibility::new(),
            page: PageState::new(settings.default_page_size),
            filtered_rows: (0..row_count).collect(),
            sorted_rows: (0..row_count).collect(),
            settings,
        }
    }

    /// Replace the result set. All view state goes back to its defaults.
    pub fn attach(&mut self, source: Arc<ResultSet>) {
        debug!(
            "Attaching result set: {} rows x {} columns",
            source.rows.len(),
            source.columns.len()
        );
        *self = Self::with_settings(source, self.settings.clone());
    }

    pub fn source(&self) -> &ResultSet {
        &self.source
    }

    pub fn source_arc(&self) -> Arc<ResultSet> {
        Arc::clone(&self.source)
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn visibility(&self) -> &ColumnVisibility {
        &self.visibility
    }

    pub fn page_state(&self) -> &PageState {
        &self.page
    }

    pub fn virtualizer(&self) -> VirtualizerConfig {
        self.settings.virtualizer()
    }

    // --- filter stage ---

    /// Set the filter text for one column; "" clears it. Returns to page 1.
    pub fn set_filter(&mut self, column: &str, value: &str) {
        if self.filters.set(column, value) {
            self.refilter();
        }
        self.page.reset();
    }

    pub fn clear_filters(&mut self) {
        if self.filters.clear() {
            self.refilter();
        }
        self.page.reset();
    }

    fn refilter(&mut self) {
        self.filtered_rows = apply_filters(&self.source.rows, &self.filters, &self.source.columns);
        self.resort();
    }

    // --- sort stage ---

    /// Header click semantics, see [`SortState::toggle`]. Returns to page 1.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort.toggle(column);
        self.resort();
        self.page.reset();
    }

    pub fn set_sort(&mut self, sort: SortState) {
        if sort != self.sort {
            self.sort = sort;
            self.resort();
        }
        self.page.reset();
    }

    fn resort(&mut self) {
        self.sorted_rows = apply_sort(&self.source.rows, self.filtered_rows.clone(), &self.sort);
    }

    // --- visibility ---

    pub fn toggle_column(&mut self, column: &str) -> bool {
        self.visibility.toggle(column)
    }

    pub fn show_all_columns(&mut self) {
        self.visibility.show_all();
    }

    pub fn visible_columns(&self) -> Vec<String> {
        self.visibility.visible_columns(&self.source.columns)
    }

    pub fn column_badge(&self) -> Option<String> {
        self.visibility.badge(&self.source.columns)
    }

    // --- paging ---

    /// Returns to page 1
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page.set_page_size(page_size);
    }

    pub fn next_page(&mut self) {
        self.page.next(self.filtered_count());
    }

    pub fn previous_page(&mut self) {
        self.page.previous();
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page.go_to(page, self.filtered_count());
    }

    pub fn current_page(&self) -> usize {
        self.page.current_page()
    }

    pub fn filtered_count(&self) -> usize {
        self.sorted_rows.len()
    }

    pub fn total_pages(&self) -> usize {
        self.page.total_pages(self.filtered_count())
    }

    pub fn page_numbers(&self) -> Vec<PageItem> {
        page_numbers(self.total_pages(), self.current_page())
    }

    pub fn page_range(&self) -> PageRange {
        PageRange::new(&self.page, self.filtered_count(), self.source.rows.len())
    }

    /// Source indices of every filtered and sorted row
    pub fn processed_indices(&self) -> &[usize] {
        &self.sorted_rows
    }

    pub fn processed_rows(&self) -> Vec<&Row> {
        self.sorted_rows.iter().map(|&idx| &self.source.rows[idx]).collect()
    }

    /// Source indices of the rows on the current page
    pub fn page_indices(&self) -> &[usize] {
        self.page.slice(&self.sorted_rows)
    }

    pub fn page_rows(&self) -> Vec<&Row> {
        self.page_indices()
            .iter()
            .map(|&idx| &self.source.rows[idx])
            .collect()
    }

    // --- virtualization ---

    pub fn render_plan(&self, scroll_offset: usize, viewport_height: usize) -> RenderPlan {
        self.virtualizer()
            .plan(self.page_indices().len(), scroll_offset, viewport_height)
    }

    /// Visible columns, the rendered slice of the current page and the pager
    pub fn page_view(&self, scroll_offset: usize, viewport_height: usize) -> PageView<'_> {
        let page = self.page_indices();
        let plan = self.render_plan(scroll_offset, viewport_height);
        let rows = plan
            .rendered_rows()
            .map(|i| (i, &self.source.rows[page[i]]))
            .collect();

        PageView {
            columns: self.visible_columns(),
            rows,
            plan,
            range: self.page_range(),
            pager: self.page_numbers(),
            current_page: self.current_page(),
            empty_message: if page.is_empty() {
                Some(self.empty_message())
            } else {
                None
            },
        }
    }

    // --- messages ---

    pub fn empty_message(&self) -> &'static str {
        if self.filters.is_active() {
            "No matching results found"
        } else {
            "No results found"
        }
    }

    /// Banner text when the executor truncated the result
    pub fn limited_notice(&self) -> Option<String> {
        let source = &self.source;
        match (source.is_limited, source.total_rows) {
            (true, Some(total)) => Some(format!(
                "Results limited: Showing {} of {} total rows.",
                format_with_commas(source.limit_applied.unwrap_or(source.row_count) as u64),
                format_with_commas(total as u64)
            )),
            _ => None,
        }
    }

    /// Banner text for large, untruncated results
    pub fn large_result_notice(&self) -> Option<String> {
        let source = &self.source;
        if source.is_limited || source.row_count <= self.settings.large_result_warning {
            return None;
        }
        Some(format!(
            "Large dataset: This query returned {} rows. Consider adding filters or a LIMIT clause for better performance.",
            format_with_commas(source.row_count as u64)
        ))
    }

    /// "{rows} rows • {ms}ms" header summary
    pub fn summary(&self) -> String {
        format!(
            "{} rows • {}ms",
            format_with_commas(self.source.row_count as u64),
            self.source.execution_time_ms
        )
    }
}
