use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::config::{Config, ExecutionConfig};
use crate::error::{Result, WorkbenchError};
use crate::executor::QueryExecutor;
use crate::history::QueryHistory;
use crate::saved_queries::{SavedQuery, SavedQueryStore};
use crate::storage::KeyValueStore;
use crate::workbench::{RunOutcome, TabId, WorkbenchState};

/// What happened to one run, as seen by the caller that started it
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub tab_id: TabId,
    pub run_id: u64,
    pub query: String,
    pub row_count: Option<usize>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs queries for workbench tabs and keeps the shared snapshot current.
///
/// The snapshot lives behind `Arc<Mutex<Arc<WorkbenchState>>>`. The mutex is
/// held only while one transition is applied, never across an await, so
/// readers clone the inner `Arc` and work on a consistent state.
pub struct QueryService<S: KeyValueStore> {
    state: Arc<Mutex<Arc<WorkbenchState>>>,
    executor: Arc<dyn QueryExecutor>,
    history: Option<Arc<QueryHistory<S>>>,
    saved_queries: Arc<SavedQueryStore<S>>,
    execution: ExecutionConfig,
}

impl<S: KeyValueStore> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            executor: Arc::clone(&self.executor),
            history: self.history.clone(),
            saved_queries: Arc::clone(&self.saved_queries),
            execution: self.execution.clone(),
        }
    }
}

impl<S: KeyValueStore + 'static> QueryService<S> {
    pub fn new(
        state: WorkbenchState,
        executor: Arc<dyn QueryExecutor>,
        store: Arc<S>,
        config: &Config,
    ) -> Self {
        let history = config
            .history
            .enabled
            .then(|| Arc::new(QueryHistory::new(Arc::clone(&store), config.history.max_entries)));

        Self {
            state: Arc::new(Mutex::new(Arc::new(state))),
            executor,
            history,
            saved_queries: Arc::new(SavedQueryStore::new(store)),
            execution: config.execution.clone(),
        }
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<WorkbenchState> {
        match self.state.lock() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Apply one transition atomically and return the new snapshot
    pub fn update(&self, f: impl FnOnce(&WorkbenchState) -> WorkbenchState) -> Arc<WorkbenchState> {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = Arc::new(f(&guard));
        *guard = Arc::clone(&next);
        next
    }

    pub fn history(&self) -> Option<&QueryHistory<S>> {
        self.history.as_deref()
    }

    pub fn saved_queries(&self) -> &SavedQueryStore<S> {
        &self.saved_queries
    }

    /// Fixed minimum plus a uniform random extra
    pub fn simulated_delay(&self) -> Duration {
        let extra = if self.execution.max_random_delay_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.execution.max_random_delay_ms)
        };
        Duration::from_millis(self.execution.min_delay_ms + extra)
    }

    /// Run the query currently in tab `id`.
    ///
    /// The tab is marked loading, the simulated latency elapses, and the
    /// outcome is applied to that same tab whatever is active by then.
    /// Returns None if the tab does not exist.
    pub async fn run(&self, id: TabId) -> Option<RunReport> {
        let mut ticket = None;
        self.update(|state| match state.begin_run(id) {
            Some((next, issued)) => {
                ticket = Some(issued);
                next
            }
            None => state.clone(),
        });
        let ticket = ticket?;

        info!(target: "query", "Run {} on tab {}: {}", ticket.run_id, id, ticket.query);
        tokio::time::sleep(self.simulated_delay()).await;

        let report = match self.executor.execute(&ticket.query) {
            Ok(result) => {
                let report = RunReport {
                    tab_id: id,
                    run_id: ticket.run_id,
                    query: ticket.query.clone(),
                    row_count: Some(result.row_count),
                    error: None,
                    execution_time_ms: result.execution_time_ms,
                };
                self.update(|state| {
                    state.complete_run(&ticket, RunOutcome::Success(Arc::new(result)))
                });
                report
            }
            Err(e) => {
                let message = e.to_string();
                self.update(|state| {
                    state.complete_run(&ticket, RunOutcome::Failure(message.clone()))
                });
                RunReport {
                    tab_id: id,
                    run_id: ticket.run_id,
                    query: ticket.query.clone(),
                    row_count: None,
                    error: Some(message),
                    execution_time_ms: 0,
                }
            }
        };

        self.record_history(&report);
        Some(report)
    }

    /// Run the split panel's tab in split view, otherwise the active tab
    pub async fn run_target(&self) -> Option<RunReport> {
        let target = self.snapshot().target_tab();
        self.run(target).await
    }

    fn record_history(&self, report: &RunReport) {
        let Some(history) = &self.history else {
            return;
        };
        let recorded = match (&report.error, report.row_count) {
            (Some(message), _) => history.record_failure(&report.query, 0, message),
            (None, rows) => history.record_success(
                &report.query,
                report.execution_time_ms,
                rows.unwrap_or(0),
            ),
        };
        if let Err(e) = recorded {
            warn!("Failed to record query history: {}", e);
        }
    }

    /// Save the target tab's query under `name` and clear its unsaved flag.
    ///
    /// A blank query is not saved and yields None.
    pub fn save_target(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<SavedQuery>> {
        let snapshot = self.snapshot();
        let target = snapshot.target_tab();
        let tab = snapshot
            .tab(target)
            .ok_or_else(|| WorkbenchError::storage(format!("no tab with id {}", target)))?;
        if tab.query.trim().is_empty() {
            return Ok(None);
        }

        let saved = self.saved_queries.put(&tab.query, name, description)?;
        self.update(|state| state.mark_saved(target));
        Ok(Some(saved))
    }
}
