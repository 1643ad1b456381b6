use chrono::{DateTime, Duration, Local, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::data::virtualizer::{RenderPlan, VirtualizerConfig};
use crate::error::{Result, WorkbenchError};
use crate::storage::KeyValueStore;

pub const QUERY_HISTORY_KEY: &str = "sql_runner_query_history";
pub const DEFAULT_MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "executionTime")]
    pub execution_time_ms: u64,
    pub row_count: usize,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl HistoryEntry {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

#[derive(Debug, Clone)]
pub struct HistoryMatch {
    pub entry: HistoryEntry,
    pub score: i64,
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub total_queries: usize,
    pub unique_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    pub average_execution_ms: u64,
    pub most_used_query: Option<(String, usize)>,
}

/// Executed queries, newest first, capped at `max_entries`.
///
/// The list is kept in memory and written through to the store after every
/// change. A store that cannot be read starts an empty history.
pub struct QueryHistory<S: KeyValueStore> {
    store: Arc<S>,
    entries: Mutex<Vec<HistoryEntry>>,
    max_entries: usize,
    matcher: SkimMatcherV2,
}

impl<S: KeyValueStore> QueryHistory<S> {
    pub fn new(store: Arc<S>, max_entries: usize) -> Self {
        let entries = Self::load(store.as_ref());
        debug!("Loaded {} history entries", entries.len());
        Self {
            store,
            entries: Mutex::new(entries),
            max_entries: max_entries.max(1),
            matcher: SkimMatcherV2::default(),
        }
    }

    fn load(store: &S) -> Vec<HistoryEntry> {
        match store.get(QUERY_HISTORY_KEY) {
            Ok(Some(data)) if !data.trim().is_empty() => {
                serde_json::from_str(&data).unwrap_or_else(|e| {
                    warn!("Ignoring unreadable query history: {}", e);
                    Vec::new()
                })
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!("Failed to read query history: {}", e);
                Vec::new()
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<HistoryEntry>>> {
        self.entries
            .lock()
            .map_err(|_| WorkbenchError::storage("history lock poisoned"))
    }

    fn persist(&self, entries: &[HistoryEntry]) -> Result<()> {
        let data = serde_json::to_string(entries)?;
        self.store.put(QUERY_HISTORY_KEY, &data)
    }

    /// Insert a prepared entry at the front and trim the tail
    pub fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.lock()?;
        self.push_front(&mut entries, entry)
    }

    fn push_front(&self, entries: &mut Vec<HistoryEntry>, entry: HistoryEntry) -> Result<()> {
        entries.insert(0, entry);
        entries.truncate(self.max_entries);
        self.persist(entries)
    }

    pub fn record_success(
        &self,
        query: &str,
        execution_time_ms: u64,
        row_count: usize,
    ) -> Result<HistoryEntry> {
        self.record_new(query, execution_time_ms, row_count, RunStatus::Success, None)
    }

    pub fn record_failure(
        &self,
        query: &str,
        execution_time_ms: u64,
        message: &str,
    ) -> Result<HistoryEntry> {
        self.record_new(
            query,
            execution_time_ms,
            0,
            RunStatus::Error,
            Some(message.to_string()),
        )
    }

    fn record_new(
        &self,
        query: &str,
        execution_time_ms: u64,
        row_count: usize,
        status: RunStatus,
        error_message: Option<String>,
    ) -> Result<HistoryEntry> {
        let timestamp = Utc::now();
        let mut entries = self.lock()?;

        // Ids are creation millis, bumped past any collision
        let mut millis = timestamp.timestamp_millis();
        while entries.iter().any(|e| e.id == millis.to_string()) {
            millis += 1;
        }

        let entry = HistoryEntry {
            id: millis.to_string(),
            query: query.to_string(),
            timestamp,
            execution_time_ms,
            row_count,
            status,
            error_message,
        };
        self.push_front(&mut entries, entry.clone())?;
        Ok(entry)
    }

    /// Snapshot of all entries, newest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Entries to draw in the history list at `scroll_offset`, windowed with
    /// the list virtualizer settings
    pub fn entries_window(
        &self,
        scroll_offset: usize,
        viewport_height: usize,
    ) -> (Vec<HistoryEntry>, RenderPlan) {
        let mut entries = self.entries();
        let plan = VirtualizerConfig::list().plan(entries.len(), scroll_offset, viewport_height);
        let rendered = plan.rendered_rows();
        entries.truncate(rendered.end);
        entries.drain(..rendered.start);
        (entries, plan)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fuzzy search over the query text. An empty pattern returns the most
    /// recent entries.
    pub fn search(&self, pattern: &str) -> Vec<HistoryMatch> {
        let entries = self.entries();
        if pattern.is_empty() {
            return entries
                .into_iter()
                .map(|entry| HistoryMatch {
                    entry,
                    score: 0,
                    indices: Vec::new(),
                })
                .collect();
        }

        let mut matches: Vec<HistoryMatch> = entries
            .into_iter()
            .filter_map(|entry| {
                self.matcher
                    .fuzzy_indices(&entry.query, pattern)
                    .map(|(score, indices)| HistoryMatch {
                        entry,
                        score,
                        indices,
                    })
            })
            .collect();

        // Best score first, newer first among equals
        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.entry.timestamp.cmp(&a.entry.timestamp))
        });
        matches
    }

    /// Entries grouped by local calendar day, newest group first.
    ///
    /// Labels are `Today`, `Yesterday` or a short date such as `Nov 3`.
    pub fn group_by_day(&self, now: DateTime<Local>) -> Vec<(String, Vec<HistoryEntry>)> {
        let today = now.date_naive();
        let yesterday = today - Duration::days(1);

        let mut groups: Vec<(String, Vec<HistoryEntry>)> = Vec::new();
        for entry in self.entries() {
            let day = entry.timestamp.with_timezone(&Local).date_naive();
            let label = if day == today {
                "Today".to_string()
            } else if day == yesterday {
                "Yesterday".to_string()
            } else {
                day.format("%b %-d").to_string()
            };

            match groups.last_mut() {
                Some((last, items)) if *last == label => items.push(entry),
                _ => groups.push((label, vec![entry])),
            }
        }
        groups
    }

    pub fn stats(&self) -> HistoryStats {
        let entries = self.entries();
        let total_queries = entries.len();
        let successful_queries = entries.iter().filter(|e| e.is_success()).count();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in &entries {
            *counts.entry(entry.query.as_str()).or_insert(0) += 1;
        }
        let most_used_query = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(query, &count)| (query.to_string(), count));

        let average_execution_ms = if total_queries == 0 {
            0
        } else {
            entries.iter().map(|e| e.execution_time_ms).sum::<u64>() / total_queries as u64
        };

        HistoryStats {
            total_queries,
            unique_queries: counts.len(),
            successful_queries,
            failed_queries: total_queries - successful_queries,
            average_execution_ms,
            most_used_query,
        }
    }

    pub fn clear(&self) -> Result<()> {
        let mut entries = self.lock()?;
        entries.clear();
        self.store.delete(QUERY_HISTORY_KEY)?;
        Ok(())
    }
}
