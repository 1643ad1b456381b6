use std::collections::HashSet;

/// Hidden column names. Visible columns are derived, never stored, so they
/// always keep the result set's original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnVisibility {
    hidden: HashSet<String>,
}

impl ColumnVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide a visible column or show a hidden one. Returns true if the column
    /// is hidden afterwards.
    pub fn toggle(&mut self, column: &str) -> bool {
        if self.hidden.remove(column) {
            false
        } else {
            self.hidden.insert(column.to_string());
            true
        }
    }

    pub fn hide(&mut self, column: &str) {
        self.hidden.insert(column.to_string());
    }

    pub fn show(&mut self, column: &str) {
        self.hidden.remove(column);
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn is_hidden(&self, column: &str) -> bool {
        self.hidden.contains(column)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    pub fn has_hidden_columns(&self) -> bool {
        !self.hidden.is_empty()
    }

    pub fn visible_columns(&self, all_columns: &[String]) -> Vec<String> {
        compute_visible_columns(all_columns, &self.hidden)
    }

    /// "visible/total" badge for the column picker, only when something is hidden
    pub fn badge(&self, all_columns: &[String]) -> Option<String> {
        if !self.has_hidden_columns() {
            return None;
        }
        let visible = all_columns.iter().filter(|c| !self.is_hidden(c)).count();
        Some(format!("{}/{}", visible, all_columns.len()))
    }
}

/// `all_columns` minus `hidden`, in original order. Hiding every column is
/// allowed and yields an empty list.
pub fn compute_visible_columns(all_columns: &[String], hidden: &HashSet<String>) -> Vec<String> {
    all_columns
        .iter()
        .filter(|c| !hidden.contains(c.as_str()))
        .cloned()
        .collect()
}
