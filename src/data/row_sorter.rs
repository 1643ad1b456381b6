use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::cell_compare::{CompareMode, SortKey};
use crate::data::result_set::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Single-column sort. `direction` only matters while `column` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            direction: SortDirection::Descending,
        }
    }

    /// Header click: the active column flips direction, any other column
    /// becomes active in ascending order.
    pub fn toggle(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.direction = self.direction.reversed();
        } else {
            self.column = Some(column.to_string());
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn is_sorted_by(&self, column: &str) -> bool {
        self.column.as_deref() == Some(column)
    }
}

/// Order `indices` (row positions into `rows`) by the sort column.
///
/// The sort is stable: rows with equal keys keep their relative input
/// order in both directions, because descending reverses the comparator
/// rather than the output. A column holding any non-empty string is
/// ordered entirely as text, otherwise numerically with blanks first.
pub fn apply_sort(rows: &[Row], mut indices: Vec<usize>, sort: &SortState) -> Vec<usize> {
    let Some(column) = sort.column.as_deref() else {
        return indices;
    };

    // One mode per column keeps the keys totally ordered
    let mode = CompareMode::for_cells(rows.iter().map(|row| row.get(column)));
    let mut keyed: Vec<(usize, SortKey)> = indices
        .drain(..)
        .map(|idx| (idx, SortKey::new(rows[idx].get(column), mode)))
        .collect();

    let descending = sort.direction == SortDirection::Descending;
    keyed.sort_by(|(_, a), (_, b)| if descending { b.cmp(a) } else { a.cmp(b) });
    indices.extend(keyed.into_iter().map(|(idx, _)| idx));

    debug!(
        "Sorted {} rows by '{}' ({:?}, {:?})",
        indices.len(),
        column,
        sort.direction,
        mode
    );
    indices
}

/// Sort a whole row slice, returning the reordered rows.
pub fn sort_rows(rows: &[Row], sort: &SortState) -> Vec<Row> {
    apply_sort(rows, (0..rows.len()).collect(), sort)
        .into_iter()
        .map(|idx| rows[idx].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cell_compare::locale_compare;
    use crate::data::result_set::CellValue;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::cmp::Ordering;

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter()
            .map(|r| match r.get("id") {
                CellValue::Integer(i) => *i,
                other => panic!("unexpected id {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_sort_by_id_ascending() {
        let rows = vec![
            Row::new().with("id", 3).with("name", "c"),
            Row::new().with("id", 1).with("name", "a"),
            Row::new().with("id", 2).with("name", "b"),
        ];
        let sorted = sort_rows(&rows, &SortState::ascending("id"));
        assert_eq!(ids(&sorted), vec![1, 2, 3]);

        let sorted = sort_rows(&rows, &SortState::descending("id"));
        assert_eq!(ids(&sorted), vec![3, 2, 1]);
    }

    #[test]
    fn test_no_column_is_passthrough() {
        let rows = vec![Row::new().with("id", 2), Row::new().with("id", 1)];
        assert_eq!(apply_sort(&rows, vec![0, 1], &SortState::none()), vec![0, 1]);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let rows = vec![
            Row::new().with("id", 10),
            Row::new().with("id", 9),
            Row::new().with("id", 100),
        ];
        assert_eq!(ids(&sort_rows(&rows, &SortState::ascending("id"))), vec![9, 10, 100]);
    }

    #[test]
    fn test_stable_in_both_directions() {
        let rows = vec![
            Row::new().with("id", 1).with("status", "active"),
            Row::new().with("id", 2).with("status", "closed"),
            Row::new().with("id", 3).with("status", "active"),
            Row::new().with("id", 4).with("status", "closed"),
            Row::new().with("id", 5).with("status", "active"),
        ];
        let asc = sort_rows(&rows, &SortState::ascending("status"));
        assert_eq!(ids(&asc), vec![1, 3, 5, 2, 4]);

        let desc = sort_rows(&rows, &SortState::descending("status"));
        assert_eq!(ids(&desc), vec![2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_nulls_sort_first_ascending() {
        let rows = vec![
            Row::new().with("id", 1).with("name", "b"),
            Row::new().with("id", 2),
            Row::new().with("id", 3).with("name", "a"),
        ];
        assert_eq!(ids(&sort_rows(&rows, &SortState::ascending("name"))), vec![2, 3, 1]);
        assert_eq!(ids(&sort_rows(&rows, &SortState::descending("name"))), vec![1, 3, 2]);
    }

    #[test]
    fn test_mixed_column_sorts_as_text() {
        let mut rng = StdRng::seed_from_u64(33);
        let rows: Vec<Row> = (0..500)
            .map(|i| {
                let n: i64 = rng.gen_range(0..1000);
                let row = Row::new().with("id", i as i64);
                if rng.gen_bool(0.5) {
                    row.with("code", n)
                } else {
                    row.with("code", format!("{}x", n))
                }
            })
            .collect();

        let texts = |sorted: &[Row]| -> Vec<String> {
            sorted.iter().map(|r| r.get("code").to_string()).collect()
        };
        let asc = texts(&sort_rows(&rows, &SortState::ascending("code")));
        assert!(asc
            .windows(2)
            .all(|w| locale_compare(&w[0], &w[1]) != Ordering::Greater));

        let desc = texts(&sort_rows(&rows, &SortState::descending("code")));
        assert!(desc
            .windows(2)
            .all(|w| locale_compare(&w[0], &w[1]) != Ordering::Less));
    }

    #[test]
    fn test_nan_column_sorts_nan_last() {
        let rows: Vec<Row> = (0..300)
            .map(|i| {
                let row = Row::new().with("id", i as i64);
                match i % 5 {
                    0 => row.with("value", f64::NAN),
                    1 => row.with("value", i as i64 - 150),
                    _ => row.with("value", ((i * 7919) % 211) as f64 - 100.5),
                }
            })
            .collect();

        let sorted = sort_rows(&rows, &SortState::ascending("value"));
        let values: Vec<f64> = sorted
            .iter()
            .map(|r| r.get("value").as_f64().unwrap())
            .collect();
        assert_eq!(values.iter().position(|v| v.is_nan()), Some(240));
        assert!(values[240..].iter().all(|v| v.is_nan()));
        assert!(values[..240].windows(2).all(|w| w[0] <= w[1]));

        // NaN ties keep input order
        let nan_ids = ids(&sorted[240..]);
        assert_eq!(nan_ids, (0..60).map(|i| i * 5).collect::<Vec<_>>());

        let desc = sort_rows(&rows, &SortState::descending("value"));
        assert!(desc[..60].iter().all(|r| r.get("value").as_f64().unwrap().is_nan()));
    }

    #[test]
    fn test_toggle() {
        let mut sort = SortState::none();
        sort.toggle("name");
        assert_eq!(sort, SortState::ascending("name"));
        sort.toggle("name");
        assert_eq!(sort, SortState::descending("name"));
        sort.toggle("id");
        assert_eq!(sort, SortState::ascending("id"));
        assert!(sort.is_sorted_by("id"));
    }
}
