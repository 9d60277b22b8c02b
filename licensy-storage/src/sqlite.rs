//! SQLite-backed record store.
//!
//! All namespaces share one `records` table keyed by `(namespace, key)`.
//! Writes are single `INSERT OR REPLACE` statements, which SQLite applies
//! atomically.

use crate::error::{StoreError, StoreResult};
use crate::record_store::{RecordStore, ScanPredicate};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

/// Rows fetched per lock acquisition during a scan.
const SCAN_CHUNK: usize = 256;

/// Persistent record store backed by SQLite.
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Opens (or creates) a record store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            error!("failed to open record store at {}: {e}", path.display());
            StoreError::StorageUnavailable(format!("failed to open record store: {e}"))
        })?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::StorageUnavailable(format!("failed to enable WAL: {e}")))?;
        conn.pragma_update(None, "synchronous", "FULL")
            .map_err(|e| StoreError::StorageUnavailable(format!("failed to set synchronous: {e}")))?;
        debug!("opened record store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Opens an in-memory SQLite store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StoreError::StorageUnavailable(format!("failed to open in-memory record store: {e}"))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS records (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                record TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            ) WITHOUT ROWID;
            ",
        )
        .map_err(|e| StoreError::StorageUnavailable(format!("failed to init schema: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::StorageUnavailable("record store lock poisoned".to_string()))
    }

    /// Reads up to [`SCAN_CHUNK`] rows of `namespace` after `after`, in key
    /// order.
    fn read_chunk(
        &self,
        namespace: &str,
        after: Option<&str>,
    ) -> StoreResult<Vec<(String, String)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT key, record FROM records
                 WHERE namespace = ?1 AND (?2 IS NULL OR key > ?2)
                 ORDER BY key ASC
                 LIMIT ?3",
            )
            .map_err(|e| StoreError::StorageUnavailable(format!("failed to prepare scan: {e}")))?;

        let rows = stmt
            .query_map(params![namespace, after, SCAN_CHUNK as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| StoreError::StorageUnavailable(format!("failed to scan records: {e}")))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::StorageUnavailable(format!("failed to read row: {e}")))
    }
}

impl RecordStore for SqliteRecordStore {
    fn read(&self, namespace: &str, key: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT record FROM records WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::StorageUnavailable(format!("failed to read record: {e}")))
    }

    fn write(&self, namespace: &str, key: &str, record: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO records (namespace, key, record) VALUES (?1, ?2, ?3)",
            params![namespace, key, record],
        )
        .map_err(|e| {
            error!("failed to write {namespace}/{key}: {e}");
            StoreError::StorageUnavailable(format!("failed to write record: {e}"))
        })?;
        Ok(())
    }

    fn scan(
        &self,
        namespace: &str,
        after: Option<&str>,
        limit: usize,
        predicate: ScanPredicate<'_>,
    ) -> StoreResult<Vec<(String, String)>> {
        let mut result = Vec::new();
        let mut cursor = after.map(str::to_string);

        // The connection lock is held for one chunk read at a time; the
        // predicate runs without it.
        while result.len() < limit {
            let chunk = self.read_chunk(namespace, cursor.as_deref())?;
            let exhausted = chunk.len() < SCAN_CHUNK;
            cursor = chunk.last().map(|(key, _)| key.clone()).or(cursor);

            for (key, record) in chunk {
                if predicate(&key, &record) {
                    result.push((key, record));
                    if result.len() == limit {
                        break;
                    }
                }
            }
            if exhausted {
                break;
            }
        }
        Ok(result)
    }
}
