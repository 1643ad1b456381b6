use std::collections::BTreeMap;
use tracing::debug;

use crate::data::result_set::Row;

/// Per-column substring filters, combined with AND.
///
/// Matching is case-insensitive. An empty value means no filter on that
/// column, so setting a column to "" removes its entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    filters: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the filter for a column. Returns true if the state changed.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) -> bool {
        let column = column.into();
        let value = value.into();
        if value.is_empty() {
            return self.filters.remove(&column).is_some();
        }
        match self.filters.get(&column) {
            Some(existing) if *existing == value => false,
            _ => {
                self.filters.insert(column, value);
                true
            }
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    /// Current filter text for a column ("" when unset)
    pub fn get(&self, column: &str) -> &str {
        self.filters.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn clear(&mut self) -> bool {
        let had_filters = !self.filters.is_empty();
        self.filters.clear();
        had_filters
    }

    pub fn is_active(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Indices of the rows that pass every active filter, in input order.
///
/// Filters naming a column outside `columns` are ignored. Runs in
/// O(rows x active filters); each needle is lower-cased once.
pub fn apply_filters(rows: &[Row], filters: &FilterState, columns: &[String]) -> Vec<usize> {
    let needles: Vec<(&str, String)> = filters
        .iter()
        .filter(|(column, _)| columns.iter().any(|c| c.as_str() == *column))
        .map(|(column, value)| (column, value.to_lowercase()))
        .collect();

    if needles.is_empty() {
        return (0..rows.len()).collect();
    }

    let matched: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            needles.iter().all(|(column, needle)| {
                row.get(column)
                    .as_text()
                    .to_lowercase()
                    .contains(needle.as_str())
            })
        })
        .map(|(idx, _)| idx)
        .collect();

    debug!(
        "Filtered {} rows down to {} with {} active filters",
        rows.len(),
        matched.len(),
        needles.len()
    );
    matched
}

/// Same as [`apply_filters`] but returns the retained rows themselves.
pub fn filter_rows(rows: &[Row], filters: &FilterState, columns: &[String]) -> Vec<Row> {
    apply_filters(rows, filters, columns)
        .into_iter()
        .map(|idx| rows[idx].clone())
        .collect()
}
