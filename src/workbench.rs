//! Tabs, split panels and per-tab run state as an immutable snapshot.
//!
//! Every transition takes `&self` and returns the next state, so a reader
//! holding an `Arc<WorkbenchState>` never observes a half-applied change.
//! Query runs are tracked with monotonically increasing run ids: every
//! completion is applied (last write wins), but only the latest run issued
//! for a tab may clear its loading flag.

use std::sync::Arc;
use tracing::debug;

use crate::data::result_set::ResultSet;
use crate::executor::example_queries;

pub type TabId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryTab {
    pub id: TabId,
    pub title: String,
    pub query: String,
    pub results: Option<Arc<ResultSet>>,
    pub has_unsaved_changes: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Id of the most recent run issued for this tab (0 = never run)
    pub latest_run: u64,
}

impl QueryTab {
    fn new(id: TabId, title: String, query: String) -> Self {
        Self {
            id,
            title,
            query,
            results: None,
            has_unsaved_changes: false,
            is_loading: false,
            error: None,
            latest_run: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Left,
    Right,
}

impl Panel {
    fn index(self) -> usize {
        match self {
            Panel::Left => 0,
            Panel::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitView {
    pub tabs: [TabId; 2],
    pub active_panel: Panel,
}

/// Issued by `begin_run`, handed back to `complete_run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub tab_id: TabId,
    pub run_id: u64,
    pub query: String,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Success(Arc<ResultSet>),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkbenchState {
    tabs: Vec<QueryTab>,
    active_tab: TabId,
    split: Option<SplitView>,
    next_tab_id: TabId,
    next_run_id: u64,
}

impl Default for WorkbenchState {
    fn default() -> Self {
        let query = example_queries()
            .first()
            .map(|q| q.query.to_string())
            .unwrap_or_default();
        Self::with_query(query)
    }
}

impl WorkbenchState {
    /// A workbench with a single "Query 1" tab holding `query`
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            tabs: vec![QueryTab::new(1, "Query 1".to_string(), query.into())],
            active_tab: 1,
            split: None,
            next_tab_id: 2,
            next_run_id: 1,
        }
    }

    pub fn tabs(&self) -> &[QueryTab] {
        &self.tabs
    }

    pub fn tab(&self, id: TabId) -> Option<&QueryTab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active_tab_id(&self) -> TabId {
        self.active_tab
    }

    pub fn active_tab(&self) -> Option<&QueryTab> {
        self.tab(self.active_tab)
    }

    pub fn split(&self) -> Option<&SplitView> {
        self.split.as_ref()
    }

    pub fn is_split(&self) -> bool {
        self.split.is_some()
    }

    /// The tab commands act on: the active panel's tab in split view,
    /// otherwise the active tab
    pub fn target_tab(&self) -> TabId {
        match &self.split {
            Some(split) => split.tabs[split.active_panel.index()],
            None => self.active_tab,
        }
    }

    fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    fn map_tab(&self, id: TabId, f: impl FnOnce(&mut QueryTab)) -> Self {
        let mut next = self.clone();
        if let Some(tab) = next.tabs.iter_mut().find(|t| t.id == id) {
            f(tab);
        }
        next
    }

    // --- tabs ---

    /// Append an empty tab and make it active
    pub fn add_tab(&self) -> Self {
        let mut next = self.clone();
        let id = next.next_tab_id;
        next.next_tab_id += 1;
        let title = format!("Query {}", next.tabs.len() + 1);
        next.tabs.push(QueryTab::new(id, title, String::new()));
        next.active_tab = id;
        debug!("Added tab {}", id);
        next
    }

    /// Remove a tab. The last remaining tab cannot be closed; closing the
    /// active tab activates the last tab left. A split that showed the
    /// closed tab is dissolved.
    pub fn close_tab(&self, id: TabId) -> Self {
        if self.tabs.len() <= 1 || self.position(id).is_none() {
            return self.clone();
        }

        let mut next = self.clone();
        next.tabs.retain(|t| t.id != id);
        if next.active_tab == id {
            if let Some(last) = next.tabs.last() {
                next.active_tab = last.id;
            }
        }
        if next.split.is_some_and(|s| s.tabs.contains(&id)) {
            next.split = None;
        }
        debug!("Closed tab {}", id);
        next
    }

    pub fn set_active_tab(&self, id: TabId) -> Self {
        if self.position(id).is_none() {
            return self.clone();
        }
        let mut next = self.clone();
        next.active_tab = id;
        next
    }

    /// Activate the next tab, wrapping at the end
    pub fn next_tab(&self) -> Self {
        self.step_tab(1)
    }

    pub fn previous_tab(&self) -> Self {
        self.step_tab(self.tabs.len().saturating_sub(1))
    }

    fn step_tab(&self, by: usize) -> Self {
        let Some(current) = self.position(self.active_tab) else {
            return self.clone();
        };
        let id = self.tabs[(current + by) % self.tabs.len()].id;
        self.set_active_tab(id)
    }

    // --- editing ---

    /// Editor change on the active tab; marks it unsaved
    pub fn set_query(&self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.map_tab(self.active_tab, |tab| {
            tab.query = query;
            tab.has_unsaved_changes = true;
        })
    }

    /// Replace the target tab's query with a saved or example one
    pub fn load_query(&self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.map_tab(self.target_tab(), |tab| {
            tab.query = query;
            tab.has_unsaved_changes = false;
        })
    }

    /// Load `SELECT * FROM <table>;` into the target tab
    pub fn select_table(&self, table: &str) -> Self {
        self.load_query(format!("SELECT * FROM {};", table))
    }

    pub fn mark_saved(&self, id: TabId) -> Self {
        self.map_tab(id, |tab| tab.has_unsaved_changes = false)
    }

    // --- split view ---

    /// Show the first two tabs side by side, or leave split view.
    /// Entering requires at least two tabs.
    pub fn toggle_split_view(&self) -> Self {
        let mut next = self.clone();
        if next.split.is_some() {
            next.split = None;
        } else if next.tabs.len() >= 2 {
            next.split = Some(SplitView {
                tabs: [next.tabs[0].id, next.tabs[1].id],
                active_panel: Panel::Left,
            });
        }
        next
    }

    pub fn set_active_panel(&self, panel: Panel) -> Self {
        let mut next = self.clone();
        if let Some(split) = next.split.as_mut() {
            split.active_panel = panel;
        }
        next
    }

    /// Show `id` in one of the split panels
    pub fn set_split_tab(&self, panel: Panel, id: TabId) -> Self {
        let mut next = self.clone();
        if next.position(id).is_some() {
            if let Some(split) = next.split.as_mut() {
                split.tabs[panel.index()] = id;
            }
        }
        next
    }

    // --- runs ---

    /// Start a run for `id`: marks it loading, clears its error and issues
    /// a ticket. Returns None for an unknown tab.
    pub fn begin_run(&self, id: TabId) -> Option<(Self, RunTicket)> {
        let tab = self.tab(id)?;
        let ticket = RunTicket {
            tab_id: id,
            run_id: self.next_run_id,
            query: tab.query.clone(),
        };

        let mut next = self.map_tab(id, |tab| {
            tab.is_loading = true;
            tab.error = None;
            tab.latest_run = ticket.run_id;
        });
        next.next_run_id += 1;
        Some((next, ticket))
    }

    /// Apply a finished run to the tab it was issued for.
    ///
    /// Success replaces the results, clears the error and the unsaved flag;
    /// failure sets the error and drops any previous results. The loading flag is cleared
    /// only when this was the latest run for the tab. A tab closed in the
    /// meantime is left alone.
    pub fn complete_run(&self, ticket: &RunTicket, outcome: RunOutcome) -> Self {
        if self.tab(ticket.tab_id).is_none() {
            debug!("Dropping result of run {} for closed tab {}", ticket.run_id, ticket.tab_id);
            return self.clone();
        }

        self.map_tab(ticket.tab_id, |tab| {
            match outcome {
                RunOutcome::Success(results) => {
                    tab.results = Some(results);
                    tab.error = None;
                    tab.has_unsaved_changes = false;
                }
                RunOutcome::Failure(message) => {
                    tab.results = None;
                    tab.error = Some(message);
                }
            }
            if tab.latest_run == ticket.run_id {
                tab.is_loading = false;
            }
        })
    }
}
