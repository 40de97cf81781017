//! Slot-based persistence
//!
//! State lives in three named slots (snapshot, history, profile), each a
//! JSON document. Backends only need get/set/remove on opaque strings;
//! [`WellnessStore`] layers typed access and read fallbacks on top.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::StoreError;
use crate::history::HistoryLog;
use crate::models::AthleteProfile;
use crate::risk::PartialSnapshot;

/// Named storage slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Snapshot,
    History,
    Profile,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Snapshot, Slot::History, Slot::Profile];

    pub fn key(&self) -> &'static str {
        match self {
            Slot::Snapshot => "athlete_snapshot",
            Slot::History => "metric_history",
            Slot::Profile => "athlete_profile",
        }
    }
}

/// Minimal key-value backend
pub trait KeyValueStore {
    fn get(&self, slot: Slot) -> Result<Option<String>, StoreError>;
    fn set(&mut self, slot: Slot, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, slot: Slot) -> Result<(), StoreError>;
}

/// In-process store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<Slot, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(&slot).cloned())
    }

    fn set(&mut self, slot: Slot, value: &str) -> Result<(), StoreError> {
        self.values.insert(slot, value.to_string());
        Ok(())
    }

    fn remove(&mut self, slot: Slot) -> Result<(), StoreError> {
        self.values.remove(&slot);
        Ok(())
    }
}

/// SQLite-backed store with one row per slot
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create or open a store at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable {
                    path: parent.to_path_buf(),
                    reason: e.to_string(),
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                slot TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE slot = ?1",
                params![slot.key()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, slot: Slot, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (slot, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![slot.key(), value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&mut self, slot: Slot) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE slot = ?1", params![slot.key()])?;
        Ok(())
    }
}

/// Typed access to the three slots
///
/// Reads never fail: a backend error or an unparseable document is logged
/// and the slot's default is returned instead.
pub struct WellnessStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> WellnessStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    fn read_slot<T: DeserializeOwned>(&self, slot: Slot) -> Option<T> {
        let raw = match self.backend.get(slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(slot = slot.key(), error = %e, "Failed to read slot, using default");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(slot = slot.key(), error = %e, "Corrupt slot contents, using default");
                None
            }
        }
    }

    fn write_slot<T: Serialize>(&mut self, slot: Slot, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
            slot: slot.key().to_string(),
            reason: e.to_string(),
        })?;
        self.backend.set(slot, &raw)
    }

    /// Stored snapshot, empty when absent or unreadable
    pub fn load_snapshot(&self) -> PartialSnapshot {
        self.read_slot(Slot::Snapshot).unwrap_or_default()
    }

    pub fn save_snapshot(&mut self, snapshot: &PartialSnapshot) -> Result<(), StoreError> {
        self.write_slot(Slot::Snapshot, snapshot)
    }

    /// Stored history, empty when absent or unreadable
    pub fn load_history(&self, capacity: usize) -> HistoryLog {
        self.read_slot::<HistoryLog>(Slot::History)
            .map(|log| HistoryLog::from_entries(log.entries().to_vec(), capacity))
            .unwrap_or_default()
    }

    pub fn save_history(&mut self, history: &HistoryLog) -> Result<(), StoreError> {
        self.write_slot(Slot::History, history)
    }

    /// Stored profile, `None` when absent or unreadable
    pub fn load_profile(&self) -> Option<AthleteProfile> {
        self.read_slot(Slot::Profile)
    }

    pub fn save_profile(&mut self, profile: &AthleteProfile) -> Result<(), StoreError> {
        self.write_slot(Slot::Profile, profile)
    }

    /// Clear snapshot, history and profile
    pub fn reset(&mut self) -> Result<(), StoreError> {
        for slot in Slot::ALL {
            self.backend.remove(slot)?;
        }
        tracing::info!("All stored athlete data cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoryEntry, MetricCategory};
    use crate::models::AthleteType;
    use tempfile::tempdir;

    #[test]
    fn test_sqlite_store_persists_across_connections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("riskradar.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set(Slot::Snapshot, "{\"hrv\":60.0}").unwrap();
            store.set(Slot::Snapshot, "{\"hrv\":65.0}").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(Slot::Snapshot).unwrap().as_deref(), Some("{\"hrv\":65.0}"));
        assert_eq!(store.get(Slot::Profile).unwrap(), None);
    }

    #[test]
    fn test_corrupt_slot_falls_back_to_default() {
        let mut backend = MemoryStore::new();
        backend.set(Slot::Snapshot, "not json").unwrap();
        backend.set(Slot::History, "{\"oops\":true}").unwrap();
        backend.set(Slot::Profile, "[]").unwrap();

        let store = WellnessStore::new(backend);
        assert_eq!(store.load_snapshot(), PartialSnapshot::default());
        assert!(store.load_history(100).is_empty());
        assert!(store.load_profile().is_none());
    }

    #[test]
    fn test_typed_round_trip_and_reset() {
        let mut store = WellnessStore::new(SqliteStore::in_memory().unwrap());

        let snapshot = PartialSnapshot {
            hrv: Some(62.0),
            past_injury: Some(true),
            ..Default::default()
        };
        store.save_snapshot(&snapshot).unwrap();

        let mut history = HistoryLog::new();
        history.append(HistoryEntry::new("hrv", 62.0, MetricCategory::Recovery), 100);
        store.save_history(&history).unwrap();

        store
            .save_profile(&AthleteProfile {
                name: "Alex".to_string(),
                age: 31,
                athlete_type: AthleteType::Runner,
            })
            .unwrap();

        assert_eq!(store.load_snapshot(), snapshot);
        assert_eq!(store.load_history(100), history);
        assert_eq!(store.load_profile().unwrap().name, "Alex");

        store.reset().unwrap();
        assert_eq!(store.load_snapshot(), PartialSnapshot::default());
        assert!(store.load_history(100).is_empty());
        assert!(store.load_profile().is_none());
    }

    #[test]
    fn test_history_is_truncated_on_load() {
        let mut store = WellnessStore::new(MemoryStore::new());
        let mut history = HistoryLog::new();
        for i in 0..20 {
            history.append(HistoryEntry::new("rpe", i as f64, MetricCategory::Training), 100);
        }
        store.save_history(&history).unwrap();

        let loaded = store.load_history(5);
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.entries()[0].value, 19.0);
    }
}
