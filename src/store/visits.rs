//! Per-monument visit counter.
//!
//! The whole table is re-serialized and written to the store on every
//! increment before the call returns, so a crash right after `increment`
//! never loses the visit.

use std::sync::{Arc, Mutex};

use crate::db::models::VisitedMonument;
use crate::db::state_keys;
use crate::error::AppError;

use super::KeyValueStore;

/// Persisted shape, matching what the web client keeps in local storage.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTable {
    visited_monuments: Vec<VisitedMonument>,
}

pub struct VisitCounter {
    store: Arc<dyn KeyValueStore>,
    table: Mutex<Vec<VisitedMonument>>,
}

impl VisitCounter {
    /// Load the existing table (if any) from `store`.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let table = match store.get(state_keys::MONUMENT_VISITS)? {
            Some(raw) => serde_json::from_str::<PersistedTable>(&raw)?.visited_monuments,
            None => Vec::new(),
        };
        tracing::debug!(entries = table.len(), "Visit counter loaded");
        Ok(Self {
            store,
            table: Mutex::new(table),
        })
    }

    /// Count one visit to `id` and persist. Returns the new count.
    pub fn increment(&self, id: &str) -> Result<u64, AppError> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        let now = chrono::Utc::now().to_rfc3339();

        let mut next = table.clone();
        let count = match next.iter_mut().find(|m| m.id == id) {
            Some(entry) => {
                entry.visit_count += 1;
                entry.last_visited = now;
                entry.visit_count
            }
            None => {
                next.push(VisitedMonument {
                    id: id.to_string(),
                    visit_count: 1,
                    last_visited: now,
                });
                1
            }
        };

        // Persist first; memory only changes once the write has succeeded.
        self.persist(&next)?;
        *table = next;

        tracing::debug!(monument_id = %id, count, "Visit counted");
        Ok(count)
    }

    /// Current count for `id`, or 0 if never visited.
    pub fn get(&self, id: &str) -> u64 {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.visit_count)
            .unwrap_or(0)
    }

    pub fn record(&self, id: &str) -> Option<VisitedMonument> {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.iter().find(|m| m.id == id).cloned()
    }

    pub fn snapshot(&self) -> Vec<VisitedMonument> {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_history(&self) -> Result<(), AppError> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        self.persist(&[])?;
        table.clear();
        tracing::info!("Visit history cleared");
        Ok(())
    }

    fn persist(&self, table: &[VisitedMonument]) -> Result<(), AppError> {
        let raw = serde_json::to_string(&PersistedTable {
            visited_monuments: table.to_vec(),
        })?;
        self.store.set(state_keys::MONUMENT_VISITS, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;
    use crate::store::{MemoryStore, SqliteStore};

    fn persisted_count(store: &dyn KeyValueStore, id: &str) -> u64 {
        let raw = store.get(state_keys::MONUMENT_VISITS).unwrap().unwrap();
        let table: PersistedTable = serde_json::from_str(&raw).unwrap();
        table
            .visited_monuments
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.visit_count)
            .unwrap_or(0)
    }

    #[test]
    fn test_fresh_id_is_zero() {
        let counter = VisitCounter::load(Arc::new(MemoryStore::new())).unwrap();
        assert_eq!(counter.get("taj-mahal"), 0);
        assert!(counter.record("taj-mahal").is_none());
    }

    #[test]
    fn test_increment_is_write_through() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let counter = VisitCounter::load(store.clone()).unwrap();

        for n in 1..=5 {
            assert_eq!(counter.increment("hampi").unwrap(), n);
            assert_eq!(counter.get("hampi"), n);
            assert_eq!(persisted_count(store.as_ref(), "hampi"), n);
        }
        assert_eq!(counter.get("red-fort"), 0);
    }

    #[test]
    fn test_last_visited_refreshes() {
        let counter = VisitCounter::load(Arc::new(MemoryStore::new())).unwrap();
        counter.increment("gol-gumbaz").unwrap();
        let first = counter.record("gol-gumbaz").unwrap().last_visited;
        std::thread::sleep(std::time::Duration::from_millis(5));
        counter.increment("gol-gumbaz").unwrap();
        let second = counter.record("gol-gumbaz").unwrap().last_visited;
        assert!(second >= first);
    }

    #[test]
    fn test_survives_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(init_test_db().unwrap()));
        {
            let counter = VisitCounter::load(store.clone()).unwrap();
            counter.increment("taj-mahal").unwrap();
            counter.increment("taj-mahal").unwrap();
            counter.increment("sanchi-stupa").unwrap();
        }
        let reloaded = VisitCounter::load(store).unwrap();
        assert_eq!(reloaded.get("taj-mahal"), 2);
        assert_eq!(reloaded.get("sanchi-stupa"), 1);
        assert_eq!(reloaded.snapshot().len(), 2);
    }

    #[test]
    fn test_clear_history() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let counter = VisitCounter::load(store.clone()).unwrap();
        counter.increment("hawa-mahal").unwrap();
        counter.clear_history().unwrap();
        assert_eq!(counter.get("hawa-mahal"), 0);
        assert_eq!(persisted_count(store.as_ref(), "hawa-mahal"), 0);
    }

    #[test]
    fn test_corrupt_table_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.set(state_keys::MONUMENT_VISITS, "{not json").unwrap();
        assert!(matches!(VisitCounter::load(store), Err(AppError::Serde(_))));
    }
}
