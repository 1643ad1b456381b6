use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::data::virtualizer::{RenderPlan, VirtualizerConfig};
use crate::error::{Result, WorkbenchError};
use crate::storage::KeyValueStore;

pub const SAVED_QUERIES_KEY: &str = "sql_runner_saved_queries";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub id: String,
    pub name: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// RFC 3339
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update; `None` leaves the field alone
#[derive(Debug, Clone, Default)]
pub struct SavedQueryPatch {
    pub name: Option<String>,
    pub query: Option<String>,
    pub description: Option<Option<String>>,
}

impl SavedQueryPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }
}

/// Named queries persisted as one JSON list, newest first.
///
/// Every mutation is a whole-list read-modify-write done under `lock`, so
/// concurrent saves from different tabs cannot drop each other's entries.
pub struct SavedQueryStore<S: KeyValueStore> {
    store: Arc<S>,
    lock: Mutex<()>,
}

impl<S: KeyValueStore> SavedQueryStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// All saved queries. Missing or unreadable data yields an empty list.
    pub fn list(&self) -> Vec<SavedQuery> {
        match self.store.get(SAVED_QUERIES_KEY) {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(queries) => queries,
                Err(e) => {
                    warn!("Ignoring unreadable saved queries: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read saved queries: {}", e);
                Vec::new()
            }
        }
    }

    fn write(&self, queries: &[SavedQuery]) -> Result<()> {
        let data = serde_json::to_string(queries)?;
        self.store.put(SAVED_QUERIES_KEY, &data)
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Vec<SavedQuery>) -> Result<(T, bool)>) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| WorkbenchError::storage("saved query lock poisoned"))?;
        let mut queries = self.list();
        let (out, changed) = f(&mut queries)?;
        if changed {
            self.write(&queries)?;
        }
        Ok(out)
    }

    /// Save a new query at the front of the list
    pub fn put(&self, query: &str, name: &str, description: Option<&str>) -> Result<SavedQuery> {
        let saved = self.modify(|queries| {
            let now = Utc::now();
            let mut millis = now.timestamp_millis();
            // Two saves in the same millisecond still get distinct ids
            while queries.iter().any(|q| q.id == format!("query_{}", millis)) {
                millis += 1;
            }

            let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
            let saved = SavedQuery {
                id: format!("query_{}", millis),
                name: name.to_string(),
                query: query.to_string(),
                description: description.map(String::from),
                created_at: stamp.clone(),
                updated_at: stamp,
            };
            queries.insert(0, saved.clone());
            Ok((saved, true))
        })?;

        info!("Saved query '{}' as {}", saved.name, saved.id);
        Ok(saved)
    }

    /// Apply `patch` and bump `updated_at`. Returns None for an unknown id.
    pub fn update(&self, id: &str, patch: SavedQueryPatch) -> Result<Option<SavedQuery>> {
        self.modify(|queries| {
            let Some(entry) = queries.iter_mut().find(|q| q.id == id) else {
                return Ok((None, false));
            };
            if let Some(name) = patch.name {
                entry.name = name;
            }
            if let Some(query) = patch.query {
                entry.query = query;
            }
            if let Some(description) = patch.description {
                entry.description = description;
            }
            entry.updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            Ok((Some(entry.clone()), true))
        })
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        self.modify(|queries| {
            let before = queries.len();
            queries.retain(|q| q.id != id);
            let removed = queries.len() != before;
            Ok((removed, removed))
        })
    }

    /// Whether another query already uses `name` (exact match)
    pub fn exists(&self, name: &str, exclude_id: Option<&str>) -> bool {
        self.list()
            .iter()
            .any(|q| q.name == name && Some(q.id.as_str()) != exclude_id)
    }

    /// Case-insensitive substring search over name, description and SQL
    pub fn search(&self, text: &str) -> Vec<SavedQuery> {
        let needle = text.to_lowercase();
        self.list()
            .into_iter()
            .filter(|q| {
                needle.is_empty()
                    || q.name.to_lowercase().contains(&needle)
                    || q.query.to_lowercase().contains(&needle)
                    || q
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// The saved queries to draw in the side list at `scroll_offset`, and the
    /// plan with spacer heights. Uses the list virtualizer settings.
    pub fn list_window(
        &self,
        scroll_offset: usize,
        viewport_height: usize,
    ) -> (Vec<SavedQuery>, RenderPlan) {
        let mut queries = self.list();
        let plan = VirtualizerConfig::list().plan(queries.len(), scroll_offset, viewport_height);
        let rendered = plan.rendered_rows();
        queries.truncate(rendered.end);
        queries.drain(..rendered.start);
        (queries, plan)
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| WorkbenchError::storage("saved query lock poisoned"))?;
        self.store.delete(SAVED_QUERIES_KEY)?;
        Ok(())
    }
}
