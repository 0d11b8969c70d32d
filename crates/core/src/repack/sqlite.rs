//! SQLite-backed repack collection.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use super::{NewRepack, RepackRow, RepackStore, RepackStoreError};

/// SQLite-backed repack store.
///
/// `uris` are kept as a JSON array in a single TEXT column and upload dates
/// as fixed-width RFC 3339 (millisecond, `Z` suffix) so that ordering by the
/// column is chronological.
pub struct SqliteRepackStore {
    conn: Mutex<Connection>,
}

/// Raw column values of one `repacks` row.
struct RawRow {
    id: i64,
    title: String,
    upload_date: String,
    uris: String,
    magnet: Option<String>,
}

impl SqliteRepackStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn new(path: &Path) -> Result<Self, RepackStoreError> {
        let conn = Connection::open(path).map_err(|e| RepackStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, RepackStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RepackStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RepackStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS repacks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                upload_date TEXT NOT NULL,
                uris TEXT NOT NULL DEFAULT '[]',
                magnet TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_repacks_upload_date ON repacks(upload_date);
            "#,
        )
        .map_err(|e| RepackStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepackStoreError> {
        self.conn
            .lock()
            .map_err(|_| RepackStoreError::Internal("connection mutex poisoned".to_string()))
    }

    fn format_date(date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Insert a repack, returning its store id.
    pub fn insert(&self, repack: &NewRepack) -> Result<i64, RepackStoreError> {
        let conn = self.conn()?;
        Self::insert_with(&conn, repack)
    }

    /// Insert several repacks in one transaction, returning how many were written.
    pub fn insert_many(&self, repacks: &[NewRepack]) -> Result<usize, RepackStoreError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepackStoreError::Database(e.to_string()))?;

        for repack in repacks {
            Self::insert_with(&tx, repack)?;
        }

        tx.commit()
            .map_err(|e| RepackStoreError::Database(e.to_string()))?;
        Ok(repacks.len())
    }

    fn insert_with(conn: &Connection, repack: &NewRepack) -> Result<i64, RepackStoreError> {
        let uris = serde_json::to_string(&repack.uris)
            .map_err(|e| RepackStoreError::Internal(e.to_string()))?;

        conn.execute(
            "INSERT INTO repacks (title, upload_date, uris, magnet) VALUES (?, ?, ?, ?)",
            params![
                repack.title,
                Self::format_date(&repack.upload_date),
                uris,
                repack.magnet,
            ],
        )
        .map_err(|e| RepackStoreError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    /// Remove every repack.
    pub fn clear(&self) -> Result<(), RepackStoreError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM repacks", [])
            .map_err(|e| RepackStoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn decode(raw: RawRow) -> Result<RepackRow, RepackStoreError> {
        let upload_date = DateTime::parse_from_rfc3339(&raw.upload_date)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                RepackStoreError::Internal(format!(
                    "invalid upload_date for repack {}: {}",
                    raw.id, e
                ))
            })?;

        let uris = match serde_json::from_str::<Vec<String>>(&raw.uris) {
            Ok(uris) => uris,
            Err(e) => {
                tracing::warn!(repack_id = raw.id, "Ignoring malformed uris: {}", e);
                Vec::new()
            }
        };

        Ok(RepackRow {
            id: raw.id,
            title: raw.title,
            upload_date,
            uris,
            magnet: raw.magnet,
        })
    }
}

impl RepackStore for SqliteRepackStore {
    fn list_by_upload_date(&self) -> Result<Vec<RepackRow>, RepackStoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, upload_date, uris, magnet
                 FROM repacks ORDER BY upload_date ASC, id ASC",
            )
            .map_err(|e| RepackStoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    upload_date: row.get(2)?,
                    uris: row.get(3)?,
                    magnet: row.get(4)?,
                })
            })
            .map_err(|e| RepackStoreError::Database(e.to_string()))?;

        let mut repacks = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| RepackStoreError::Database(e.to_string()))?;
            repacks.push(Self::decode(raw)?);
        }
        Ok(repacks)
    }

    fn count(&self) -> Result<u64, RepackStoreError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM repacks", [], |row| row.get(0))
            .map_err(|e| RepackStoreError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}
