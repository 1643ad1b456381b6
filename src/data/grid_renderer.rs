use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use crate::data::grid_view::PageView;
use crate::data::pagination::PageItem;

/// Render one page of the grid as a text table.
///
/// Only the rows of the rendered window are materialized. When the page is
/// windowed, the skipped space above and below is reported as spacer lines
/// so the output still accounts for every row on the page.
pub fn render_page(page: &PageView<'_>) -> String {
    let mut out = String::new();

    if page.columns.is_empty() {
        // Zero visible columns is legal and renders as an empty table
        out.push_str("(no visible columns)\n");
    } else if let Some(message) = page.empty_message {
        out.push_str(message);
        out.push('\n');
    } else {
        if page.plan.top_spacer() > 0 {
            out.push_str(&format!(
                "... {} rows above ({} units)\n",
                page.rows.first().map(|(i, _)| *i).unwrap_or(0),
                page.plan.top_spacer()
            ));
        }

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(
            page.columns
                .iter()
                .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        for (_, row) in &page.rows {
            table.add_row(
                page.columns
                    .iter()
                    .map(|c| row.get(c).as_text().into_owned())
                    .collect::<Vec<_>>(),
            );
        }
        out.push_str(&table.to_string());
        out.push('\n');

        if page.plan.bottom_spacer() > 0 {
            out.push_str(&format!(
                "... more rows below ({} units)\n",
                page.plan.bottom_spacer()
            ));
        }
    }

    if page.range.show_pager() {
        out.push_str(&page.range.label());
        out.push('\n');
        out.push_str(&render_pager(&page.pager, page.current_page));
        out.push('\n');
    }

    out
}

/// `1 … 5 [6] 7 … 12`
pub fn render_pager(items: &[PageItem], current_page: usize) -> String {
    items
        .iter()
        .map(|item| match item {
            PageItem::Page(n) if *n == current_page => format!("[{}]", n),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
