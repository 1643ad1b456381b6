use sql_workbench::data::cell_compare::locale_compare;
use sql_workbench::data::column_filter::{apply_filters, FilterState};
use sql_workbench::data::column_visibility::ColumnVisibility;
use sql_workbench::data::data_exporter::DataExporter;
use sql_workbench::data::grid_renderer::render_page;
use sql_workbench::data::grid_view::GridView;
use sql_workbench::data::pagination::{page_numbers, paginate, total_pages, PageItem, PageSize};
use sql_workbench::data::row_sorter::{apply_sort, SortDirection, SortState};
use sql_workbench::data::virtualizer::{compute_window, VirtualizerConfig};
use sql_workbench::{CellValue, ResultSet, Row};
use std::cmp::Ordering;
use std::sync::Arc;

fn people() -> ResultSet {
    let names = [
        "John Doe",
        "Jane Smith",
        "Bob Johnson",
        "alice",
        "Alice",
        "Zoë",
        "",
        "bob",
    ];
    let rows = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let row = Row::new()
                .with("id", i as i64)
                .with("name", *name)
                .with("team", (i % 3) as i64);
            if i == 6 {
                row
            } else {
                row.with("score", (i * 13 % 7) as f64 + 0.5)
            }
        })
        .collect();
    ResultSet::new(
        vec!["id".into(), "name".into(), "team".into(), "score".into()],
        rows,
    )
}

fn numbered(count: usize) -> ResultSet {
    let rows = (0..count)
        .map(|i| {
            Row::new()
                .with("id", i as i64)
                .with("name", format!("User {}", i))
                .with("bucket", (i % 4) as i64)
        })
        .collect();
    ResultSet::new(vec!["id".into(), "name".into(), "bucket".into()], rows)
}

fn ids(result: &ResultSet, indices: &[usize]) -> Vec<i64> {
    indices
        .iter()
        .map(|&i| match result.rows[i].get("id") {
            CellValue::Integer(id) => *id,
            other => panic!("unexpected id {:?}", other),
        })
        .collect()
}

#[test]
fn filter_is_idempotent() {
    let data = people();
    let filters = FilterState::new().with("name", "o");

    let once = apply_filters(&data.rows, &filters, &data.columns);
    let survivors: Vec<Row> = once.iter().map(|&i| data.rows[i].clone()).collect();
    let twice = apply_filters(&survivors, &filters, &data.columns);

    assert_eq!(twice.len(), once.len());
    assert_eq!(twice, (0..once.len()).collect::<Vec<_>>());
}

#[test]
fn filter_matches_case_insensitive_substring() {
    let data = people();
    let filters = FilterState::new().with("name", "jo");
    let kept = apply_filters(&data.rows, &filters, &data.columns);
    let names: Vec<String> = kept
        .iter()
        .map(|&i| data.rows[i].get("name").to_string())
        .collect();
    assert_eq!(names, vec!["John Doe", "Bob Johnson"]);
}

#[test]
fn filters_combine_with_and() {
    let data = people();
    let filters = FilterState::new().with("name", "b").with("team", "2");
    let kept = apply_filters(&data.rows, &filters, &data.columns);
    // "Bob Johnson" is id 2 (team 2), "bob" is id 7 (team 1)
    assert_eq!(ids(&data, &kept), vec![2]);
}

#[test]
fn sort_is_stable() {
    let data = numbered(40);
    let sort = SortState::ascending("bucket");
    let sorted = apply_sort(&data.rows, (0..40).collect(), &sort);

    for pair in sorted.windows(2) {
        let (a, b) = (&data.rows[pair[0]], &data.rows[pair[1]]);
        if a.get("bucket") == b.get("bucket") {
            assert!(pair[0] < pair[1], "equal keys must keep input order");
        }
    }

    let descending = apply_sort(&data.rows, (0..40).collect(), &SortState::descending("bucket"));
    let first_bucket: Vec<i64> = ids(&data, &descending[..10]);
    assert_eq!(first_bucket, (0..10).map(|i| 4 * i + 3).collect::<Vec<_>>());
}

#[test]
fn sort_orders_numbers_and_text() {
    let data = people();
    let by_score = apply_sort(&data.rows, (0..8).collect(), &SortState::ascending("score"));
    // The row without a score sorts first
    assert_eq!(by_score[0], 6);

    let by_name = apply_sort(&data.rows, (0..8).collect(), &SortState::ascending("name"));
    let names: Vec<String> = by_name
        .iter()
        .map(|&i| data.rows[i].get("name").to_string())
        .collect();
    assert_eq!(names[0], "");
    assert_eq!(&names[1..3], &["alice", "Alice"]);
    assert_eq!(names.last().map(String::as_str), Some("Zoë"));
}

#[test]
fn sort_mixed_column() {
    // Numbers next to strings like "1a" would cycle under a pairwise rule
    let rows = (0..1200)
        .map(|i| {
            let n = (i * 37 % 101) as i64;
            let row = Row::new().with("id", i as i64);
            match i % 4 {
                0 => row.with("code", format!("{}a", n)),
                1 => row.with("code", n as f64 + 0.5),
                2 => row,
                _ => row.with("code", n),
            }
        })
        .collect();
    let data = ResultSet::new(vec!["id".into(), "code".into()], rows);

    let mut view = GridView::new(Arc::new(data));
    view.toggle_sort("code");
    let codes: Vec<String> = view
        .processed_rows()
        .iter()
        .map(|r| r.get("code").to_string())
        .collect();
    assert_eq!(codes.len(), 1200);
    assert!(codes[..300].iter().all(String::is_empty));
    assert!(codes
        .windows(2)
        .all(|w| locale_compare(&w[0], &w[1]) != Ordering::Greater));

    view.toggle_sort("code");
    assert!(view.processed_rows()[900..]
        .iter()
        .all(|r| r.get("code").is_null()));
}

#[test]
fn sort_numeric_column_with_nan() {
    let rows = (0..400)
        .map(|i| {
            let value = if i % 4 == 0 {
                f64::NAN
            } else {
                (i * 7919 % 997) as f64 / 3.0
            };
            Row::new().with("id", i as i64).with("value", value)
        })
        .collect();
    let data = ResultSet::new(vec!["id".into(), "value".into()], rows);

    let sorted = apply_sort(&data.rows, (0..400).collect(), &SortState::ascending("value"));
    let values: Vec<f64> = sorted
        .iter()
        .map(|&i| data.rows[i].get("value").as_f64().unwrap())
        .collect();
    assert!(values[..300].windows(2).all(|w| w[0] <= w[1]));
    assert!(values[300..].iter().all(|v| v.is_nan()));
}

#[test]
fn sort_accented_names() {
    let rows = ["Zoe", "Émile", "Elena", "Fred", "zoë", "Zof"]
        .iter()
        .map(|name| Row::new().with("name", *name))
        .collect();
    let data = ResultSet::new(vec!["name".into()], rows);
    let sorted = apply_sort(&data.rows, (0..6).collect(), &SortState::ascending("name"));
    let names: Vec<String> = sorted
        .iter()
        .map(|&i| data.rows[i].get("name").to_string())
        .collect();
    assert_eq!(names, vec!["Elena", "Émile", "Fred", "Zoe", "zoë", "Zof"]);
}

#[test]
fn sort_toggle_cycle() {
    let mut sort = SortState::none();
    sort.toggle("id");
    assert_eq!(sort.direction, SortDirection::Ascending);
    sort.toggle("id");
    assert_eq!(sort.direction, SortDirection::Descending);
    sort.toggle("name");
    assert_eq!(sort, SortState::ascending("name"));
}

#[test]
fn pagination_covers_every_row_once() {
    let data = numbered(233);
    let filters = FilterState::new().with("name", "1");
    let filtered = apply_filters(&data.rows, &filters, &data.columns);
    let sorted = apply_sort(&data.rows, filtered, &SortState::descending("bucket"));

    for size in PageSize::ALL {
        let pages = total_pages(sorted.len(), size.rows());
        let rebuilt: Vec<usize> = (1..=pages)
            .flat_map(|page| paginate(&sorted, size.rows(), page).to_vec())
            .collect();
        assert_eq!(rebuilt, sorted, "page size {}", size);
    }
}

#[test]
fn virtual_window_contains_visible_rows_and_keeps_extent() {
    let config = VirtualizerConfig::default();
    let row_count = 500;
    for offset in (0..row_count * 45 + 2000).step_by(313) {
        let window = compute_window(offset, 600, 45, row_count, config.overscan);
        assert!(window.rendered.start <= window.visible.start);
        assert!(window.visible.end <= window.rendered.end);
        assert!(window.rendered.end <= row_count);
        assert_eq!(
            window.top_spacer + window.rendered_count() * 45 + window.bottom_spacer,
            config.total_height(row_count)
        );
    }

    let plain = VirtualizerConfig {
        threshold: usize::MAX,
        ..config
    };
    assert_eq!(
        plain.plan(row_count, 0, 600).total_height(),
        config.plan(row_count, 0, 600).total_height()
    );
}

#[test]
fn csv_round_trip_preserves_fields() {
    let data = ResultSet::new(
        vec!["name".into(), "note".into(), "amount".into()],
        vec![
            Row::new()
                .with("name", "Monitor 27\"")
                .with("note", "one, two")
                .with("amount", 3.0),
            Row::new()
                .with("name", "multi\nline")
                .with("note", "plain")
                .with("amount", 12),
            Row::new().with("name", "sparse"),
        ],
    );

    let csv = DataExporter::to_csv(&data).unwrap();
    let (header, rows) = DataExporter::parse_csv(&csv).unwrap();
    assert_eq!(header, data.columns);
    assert_eq!(
        rows,
        vec![
            vec!["Monitor 27\"", "one, two", "3"],
            vec!["multi\nline", "plain", "12"],
            vec!["sparse", "", ""],
        ]
    );
}

#[test]
fn export_ignores_view_state() {
    let data = Arc::new(numbered(60));
    let mut view = GridView::new(Arc::clone(&data));
    view.set_filter("name", "User 5");
    view.toggle_sort("id");
    view.toggle_column("bucket");

    let csv = DataExporter::to_csv(view.source()).unwrap();
    assert_eq!(csv.lines().count(), 61);
    assert!(csv.starts_with("id,name,bucket"));
}

#[test]
fn scenario_sort_by_id() {
    let data = ResultSet::new(
        vec!["id".into(), "name".into()],
        vec![
            Row::new().with("id", 3).with("name", "c"),
            Row::new().with("id", 1).with("name", "a"),
            Row::new().with("id", 2).with("name", "b"),
        ],
    );
    let mut view = GridView::new(Arc::new(data));
    view.toggle_sort("id");
    let order: Vec<String> = view
        .processed_rows()
        .iter()
        .map(|r| r.get("id").to_string())
        .collect();
    assert_eq!(order, vec!["1", "2", "3"]);
}

#[test]
fn scenario_page_three_of_five() {
    let data = numbered(120);
    assert_eq!(total_pages(120, 25), 5);
    assert_eq!(paginate(&data.rows, 25, 3), &data.rows[50..75]);

    let mut view = GridView::new(Arc::new(data));
    view.go_to_page(3);
    assert_eq!(view.page_indices(), &(50..75).collect::<Vec<_>>()[..]);
}

#[test]
fn scenario_pager_with_ellipses() {
    use PageItem::{Ellipsis, Page};
    assert_eq!(
        page_numbers(12, 6),
        vec![Page(1), Ellipsis, Page(5), Page(6), Page(7), Ellipsis, Page(12)]
    );
}

#[test]
fn scenario_hide_every_column() {
    let data = people();
    let mut visibility = ColumnVisibility::new();
    for column in &data.columns {
        visibility.hide(column);
    }
    assert!(visibility.visible_columns(&data.columns).is_empty());

    let mut view = GridView::new(Arc::new(data));
    for column in view.source().columns.clone() {
        view.toggle_column(&column);
    }
    let page = view.page_view(0, 600);
    assert!(page.columns.is_empty());
    assert!(!render_page(&page).is_empty());
}

#[test]
fn grid_view_recomputes_only_what_changed() {
    let data = Arc::new(numbered(1000));
    let mut view = GridView::new(Arc::clone(&data));
    view.set_filter("name", "9");
    view.toggle_sort("bucket");
    let sorted = view.processed_indices().to_vec();

    view.set_page_size(PageSize::Fifty);
    view.go_to_page(3);
    assert_eq!(view.processed_indices(), &sorted[..]);
    assert_eq!(view.page_indices(), &sorted[100..150]);
}
