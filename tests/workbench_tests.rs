use sql_workbench::config::config::Config;
use sql_workbench::data::grid_view::GridView;
use sql_workbench::history::{QueryHistory, RunStatus, DEFAULT_MAX_ENTRIES};
use sql_workbench::saved_queries::SavedQueryStore;
use sql_workbench::services::QueryService;
use sql_workbench::storage::FileStore;
use sql_workbench::workbench::Panel;
use sql_workbench::{MockExecutor, QueryExecutor, WorkbenchState};
use std::sync::Arc;

fn instant_config() -> Config {
    let mut config = Config::default();
    config.execution.min_delay_ms = 0;
    config.execution.max_random_delay_ms = 0;
    config
}

fn service(store: Arc<FileStore>) -> QueryService<FileStore> {
    QueryService::new(
        WorkbenchState::default(),
        Arc::new(MockExecutor::new().unwrap()),
        store,
        &instant_config(),
    )
}

#[tokio::test]
async fn large_users_result_flows_into_grid() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Arc::new(FileStore::new(dir.path())));
    service.update(|s| s.set_query("SELECT * FROM users"));

    let report = service.run_target().await.unwrap();
    assert_eq!(report.row_count, Some(1000));

    let snapshot = service.snapshot();
    let results = snapshot.active_tab().unwrap().results.clone().unwrap();
    let view = GridView::new(results);
    assert_eq!(view.total_pages(), 40);
    assert_eq!(
        view.limited_notice().as_deref(),
        Some("Results limited: Showing 1,000 of 1,250 total rows.")
    );
    assert!(view.large_result_notice().is_none());
}

#[tokio::test]
async fn split_view_runs_active_panel_tab() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Arc::new(FileStore::new(dir.path())));

    service.update(|s| {
        s.add_tab()
            .set_query("SELECT * FROM revenue")
            .toggle_split_view()
            .set_active_panel(Panel::Right)
    });
    let snapshot = service.snapshot();
    let left = snapshot.tabs()[0].id;
    let right = snapshot.tabs()[1].id;

    let report = service.run_target().await.unwrap();
    assert_eq!(report.tab_id, right);

    let snapshot = service.snapshot();
    let right_tab = snapshot.tab(right).unwrap();
    assert_eq!(right_tab.results.as_ref().unwrap().columns, vec!["month", "revenue"]);
    assert!(snapshot.tab(left).unwrap().results.is_none());
}

#[tokio::test]
async fn one_tab_error_does_not_touch_another() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Arc::new(FileStore::new(dir.path())));
    let first = service.snapshot().active_tab_id();
    service.run(first).await.unwrap();

    service.update(|s| s.add_tab().set_query("UPDATE users SET name = 'x'"));
    let second = service.snapshot().active_tab_id();
    let report = service.run(second).await.unwrap();
    assert_eq!(report.error.as_deref(), Some("Unsupported statement: UPDATE"));

    let snapshot = service.snapshot();
    assert!(snapshot.tab(first).unwrap().results.is_some());
    assert!(snapshot.tab(first).unwrap().error.is_none());
    assert!(snapshot.tab(second).unwrap().error.is_some());
}

#[tokio::test]
async fn concurrent_runs_settle_on_a_result() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Arc::new(FileStore::new(dir.path())));
    let tab = service.snapshot().active_tab_id();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let runner = service.clone();
            tokio::spawn(async move { runner.run(tab).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_success());
    }

    let snapshot = service.snapshot();
    let tab = snapshot.tab(tab).unwrap();
    assert!(!tab.is_loading);
    assert_eq!(tab.results.as_ref().unwrap().rows.len(), 10);
    assert_eq!(service.history().unwrap().len(), 4);
}

#[tokio::test]
async fn saved_queries_and_history_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let service = service(Arc::new(FileStore::new(dir.path())));
        service.run_target().await.unwrap();
        service.update(|s| s.set_query("SELECT * FROM customers"));
        service.save_target("Customers", None).unwrap().unwrap();
    }

    let store = Arc::new(FileStore::new(dir.path()));
    let saved = SavedQueryStore::new(Arc::clone(&store));
    assert_eq!(saved.list()[0].name, "Customers");
    assert!(saved.exists("Customers", None));

    let history = QueryHistory::new(store, DEFAULT_MAX_ENTRIES);
    let entries = history.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, RunStatus::Success);
    assert_eq!(entries[0].query, "SELECT * FROM products;");
}

#[test]
fn corrupt_saved_queries_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sql_runner_saved_queries.json"), "not json").unwrap();
    let saved = SavedQueryStore::new(Arc::new(FileStore::new(dir.path())));
    assert!(saved.list().is_empty());
}

#[test]
fn config_file_drives_grid_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[grid]\ndefault_page_size = 10\nvirtualization_threshold = 5\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    let result = MockExecutor::new()
        .unwrap()
        .execute("SELECT * FROM products")
        .unwrap();
    let view = GridView::with_settings(Arc::new(result), config.grid);
    assert_eq!(view.page_rows().len(), 10);
    assert!(view.render_plan(0, 90).is_virtualized());
}
