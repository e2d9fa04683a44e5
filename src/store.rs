// 💾 Key-value store - injected persistence for parsed transfers
//
// Replaces browser-local storage. Two backends:
// - MemoryStore: tests, short-lived CLI runs
// - SqliteStore: one `kv` table, WAL mode

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::deduplication::merge_parsed_transfers;
use crate::events::{EventBus, RefreshEvent};
use crate::transfer::Transfer;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// ============================================================================
// MEMORY STORE
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store database: {:?}", path))?;
        // Enable WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_store(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("store connection lock poisoned"))?;
        f(&conn)
    }
}

pub fn setup_store(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
                .optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
                params![key, value],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(())
        })
    }
}

// ============================================================================
// PARSED TRANSFER CACHE
// ============================================================================

pub const PARSED_TRANSFERS_KEY: &str = "parsed_transfers";

/// Transfers extracted from crawled pages, cached between runs
pub struct ParsedTransferCache<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ParsedTransferCache<S> {
    pub fn new(store: S) -> Self {
        ParsedTransferCache { store }
    }

    /// Merge-deduplicate and persist; returns what was stored
    pub fn store_parsed(&self, transfers: &[Transfer]) -> Result<Vec<Transfer>> {
        let merged = merge_parsed_transfers(transfers);
        let json = serde_json::to_string(&merged).context("Failed to serialize parsed transfers")?;
        self.store.set(PARSED_TRANSFERS_KEY, &json)?;
        tracing::info!(count = merged.len(), "Stored parsed transfers");
        Ok(merged)
    }

    /// Cached transfers; a corrupt cache entry reads as empty
    pub fn parsed(&self) -> Result<Vec<Transfer>> {
        let Some(json) = self.store.get(PARSED_TRANSFERS_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&json) {
            Ok(transfers) => Ok(transfers),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable parsed transfer cache");
                Ok(Vec::new())
            }
        }
    }

    /// Cached transfers first, then fixtures, merged on (player, destination)
    pub fn merge_with_static(&self, fixtures: &[Transfer]) -> Result<Vec<Transfer>> {
        let mut combined = self.parsed()?;
        combined.extend_from_slice(fixtures);
        Ok(merge_parsed_transfers(&combined))
    }

    pub fn clear(&self, bus: &dyn EventBus) -> Result<()> {
        self.store.remove(PARSED_TRANSFERS_KEY)?;
        bus.publish(RefreshEvent::CacheCleared {
            key: PARSED_TRANSFERS_KEY.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
