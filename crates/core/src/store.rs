// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed persistent queue of offline actions.
//!
//! The [`QueueStore`] owns one lazily opened connection. Nothing touches the
//! disk until the first operation; the connection is then opened, migrated and
//! memoised for the rest of the session. Every storage failure is returned to
//! the caller: dropping an offline action silently is never acceptable.
//!
//! Only one writer per queue file is assumed. Callers running several
//! processes against the same file must serialize access themselves.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::action::{ActionId, ActionRecord, ActionType, CaseRef, NewAction};
use crate::error::{Error, Result};

/// SQL schema for the offline queue database.
pub const SCHEMA: &str = r#"
-- Deferred case actions. AUTOINCREMENT keeps ids monotonic across purges.
CREATE TABLE IF NOT EXISTS offline_actions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    case_id TEXT,
    data TEXT NOT NULL,
    idempotency_key TEXT NOT NULL UNIQUE,
    queued_at TEXT NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0,
    synced_at TEXT,
    CHECK (synced IN (0, 1)),
    CHECK (synced = 0 OR synced_at IS NOT NULL)
);

-- Server ids assigned to cases that were registered offline
CREATE TABLE IF NOT EXISTS case_refs (
    action_id INTEGER PRIMARY KEY,
    case_id TEXT NOT NULL,
    resolved_at TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_offline_actions_type ON offline_actions(type);
CREATE INDEX IF NOT EXISTS idx_offline_actions_queued_at ON offline_actions(queued_at);
CREATE INDEX IF NOT EXISTS idx_offline_actions_pending ON offline_actions(synced, id);

-- Queued intent is immutable; sync state only moves forward
CREATE TRIGGER IF NOT EXISTS offline_actions_immutable
BEFORE UPDATE OF type, case_id, data, idempotency_key, queued_at ON offline_actions
BEGIN
    SELECT RAISE(ABORT, 'offline action records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS offline_actions_no_unsync
BEFORE UPDATE OF synced ON offline_actions
WHEN OLD.synced = 1 AND NEW.synced = 0
BEGIN
    SELECT RAISE(ABORT, 'synced actions cannot be re-queued');
END;
"#;

const RECORD_COLUMNS: &str =
    "id, type, case_id, data, idempotency_key, queued_at, synced, synced_at";

fn conversion_error(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::CorruptedData(message)),
    )
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value
        .parse()
        .map_err(|_| conversion_error(format!("invalid value '{value}' in column '{column}'")))
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| conversion_error(format!("invalid timestamp '{value}' in column '{column}'")))
}

/// Fixed-width timestamps so that text order on `queued_at` is time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> std::result::Result<ActionRecord, rusqlite::Error> {
    let type_str: String = row.get("type")?;
    let data_str: String = row.get("data")?;
    let queued_at: String = row.get("queued_at")?;
    let synced_at: Option<String> = row.get("synced_at")?;

    Ok(ActionRecord {
        id: ActionId(row.get("id")?),
        action_type: parse_db(&type_str, "type")?,
        case_id: row.get("case_id")?,
        data: serde_json::from_str(&data_str)
            .map_err(|_| conversion_error(format!("invalid JSON in column 'data': {data_str}")))?,
        idempotency_key: row.get("idempotency_key")?,
        queued_at: parse_timestamp(&queued_at, "queued_at")?,
        synced: row.get::<_, i64>("synced")? != 0,
        synced_at: synced_at
            .map(|s| parse_timestamp(&s, "synced_at"))
            .transpose()?,
    })
}

fn to_count(n: i64) -> usize {
    usize::try_from(n).unwrap_or_default()
}

/// Run schema creation on a database connection.
///
/// Idempotent; safe to call on every open.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Durable queue of offline actions.
pub struct QueueStore {
    /// Database file, or `None` for an in-memory store.
    path: Option<PathBuf>,
    /// Memoised connection, opened on first use.
    conn: Mutex<Option<Connection>>,
}

impl QueueStore {
    /// Create a store backed by the given file. The file is opened lazily.
    pub fn new(path: &Path) -> Self {
        QueueStore {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(None),
        }
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = open_memory_connection()?;
        Ok(QueueStore {
            path: None,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true once the connection has been opened.
    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Drop the connection. The next operation reopens it.
    ///
    /// Closing an in-memory store discards its contents.
    pub fn close(&self) {
        if let Ok(mut guard) = self.conn.lock() {
            guard.take();
        }
    }

    /// Run `f` with the memoised connection, opening it if needed.
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| Error::StoreUnavailable("queue lock poisoned".to_string()))?;

        if guard.is_none() {
            let conn = match &self.path {
                Some(path) => open_file_connection(path)?,
                None => open_memory_connection()?,
            };
            *guard = Some(conn);
        }

        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(Error::StoreUnavailable("connection not open".to_string())),
        }
    }

    /// Persist a new action and return its id.
    ///
    /// Stamps `queued_at`, a fresh idempotency key, and `synced = false`.
    pub fn enqueue(&self, action: &NewAction) -> Result<ActionId> {
        self.enqueue_with_key(action, &uuid::Uuid::new_v4().to_string())
    }

    /// Persist a new action under an idempotency key the caller already used,
    /// e.g. for a direct call that failed before the server answered.
    pub fn enqueue_with_key(&self, action: &NewAction, key: &str) -> Result<ActionId> {
        action.validate()?;
        let case_ref = action.case_ref()?;
        // Canonical form, so `local:01` is stored as `local:1`
        let case_id = case_ref.as_ref().map(CaseRef::to_string);
        let data = serde_json::to_string(&action.data)?;
        let queued_at = format_timestamp(Utc::now());

        let id = self.with_conn(|conn| {
            if let Some(CaseRef::Local(target)) = &case_ref {
                ensure_local_case(conn, *target)?;
            }
            conn.execute(
                "INSERT INTO offline_actions (type, case_id, data, idempotency_key, queued_at, synced)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![
                    action.action_type.as_str(),
                    case_id,
                    data,
                    key,
                    queued_at,
                ],
            )?;
            Ok(ActionId(conn.last_insert_rowid()))
        })?;

        tracing::debug!(id = id.0, action_type = %action.action_type, "action queued");
        Ok(id)
    }

    /// Get a single record by id.
    pub fn get(&self, id: ActionId) -> Result<ActionRecord> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {RECORD_COLUMNS} FROM offline_actions WHERE id = ?1");
            conn.query_row(&sql, [id.0], row_to_record)
                .optional()?
                .ok_or(Error::ActionNotFound(id.0))
        })
    }

    /// All unsynced records in queue order.
    ///
    /// Returns a fresh snapshot on every call.
    pub fn list_pending(&self) -> Result<Vec<ActionRecord>> {
        self.query_records("WHERE synced = 0 ORDER BY id ASC", [])
    }

    /// Every record still stored, synced or not, in queue order.
    pub fn list_all(&self) -> Result<Vec<ActionRecord>> {
        self.query_records("ORDER BY id ASC", [])
    }

    /// Stored records of one type, in queue order.
    pub fn list_by_type(&self, action_type: ActionType) -> Result<Vec<ActionRecord>> {
        self.query_records("WHERE type = ?1 ORDER BY id ASC", [action_type.as_str()])
    }

    fn query_records<P: rusqlite::Params>(
        &self,
        clause: &str,
        params: P,
    ) -> Result<Vec<ActionRecord>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {RECORD_COLUMNS} FROM offline_actions {clause}");
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map(params, row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    /// Number of unsynced records.
    pub fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM offline_actions WHERE synced = 0",
                [],
                |row| row.get(0),
            )?;
            Ok(to_count(n))
        })
    }

    /// Mark a record as synced.
    ///
    /// Returns false if the record was already synced. Unknown ids are an error.
    pub fn mark_synced(&self, id: ActionId) -> Result<bool> {
        let synced_at = format_timestamp(Utc::now());
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE offline_actions SET synced = 1, synced_at = ?2 WHERE id = ?1 AND synced = 0",
                params![id.0, synced_at],
            )?;
            if changed == 0 {
                ensure_exists(conn, id)?;
            }
            Ok(changed > 0)
        })
    }

    /// Mark a `CREATE_CASE` record as synced and remember the server case id
    /// so later `local:<id>` references resolve to it.
    pub fn mark_created(&self, id: ActionId, server_case_id: &str) -> Result<bool> {
        let now = format_timestamp(Utc::now());
        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let type_str: Option<String> = tx
                .query_row(
                    "SELECT type FROM offline_actions WHERE id = ?1",
                    [id.0],
                    |row| row.get(0),
                )
                .optional()?;
            let action_type: ActionType = type_str.ok_or(Error::ActionNotFound(id.0))?.parse()?;
            if action_type != ActionType::CreateCase {
                return Err(Error::InvalidPayload {
                    action_type: action_type.to_string(),
                    reason: "only CREATE_CASE actions create cases".to_string(),
                });
            }

            let changed = tx.execute(
                "UPDATE offline_actions SET synced = 1, synced_at = ?2 WHERE id = ?1 AND synced = 0",
                params![id.0, now],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO case_refs (action_id, case_id, resolved_at) VALUES (?1, ?2, ?3)",
                params![id.0, server_case_id, now],
            )?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    /// Resolve a case reference to a server case id.
    ///
    /// Server references resolve to themselves; local references resolve once
    /// their `CREATE_CASE` action has synced.
    pub fn resolve_case(&self, case_ref: &CaseRef) -> Result<Option<String>> {
        match case_ref {
            CaseRef::Server(id) => Ok(Some(id.clone())),
            CaseRef::Local(action_id) => self.with_conn(|conn| {
                let case_id = conn
                    .query_row(
                        "SELECT case_id FROM case_refs WHERE action_id = ?1",
                        [action_id.0],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(case_id)
            }),
        }
    }

    /// Delete every synced record. Pending records are untouched.
    ///
    /// Returns the number of records removed.
    pub fn purge_synced(&self) -> Result<usize> {
        let removed = self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM offline_actions WHERE synced = 1", [])?;
            // Keep server ids that pending updates still point at
            tx.execute(
                "DELETE FROM case_refs
                 WHERE action_id NOT IN (SELECT id FROM offline_actions)
                   AND ('local:' || action_id) NOT IN (
                       SELECT case_id FROM offline_actions
                       WHERE synced = 0 AND case_id IS NOT NULL
                   )",
                [],
            )?;
            tx.commit()?;
            Ok(removed)
        })?;

        tracing::debug!(removed, "purged synced actions");
        Ok(removed)
    }

    /// Delete everything. Operator reset only.
    pub fn purge_all(&self) -> Result<usize> {
        let removed = self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM offline_actions", [])?;
            tx.execute("DELETE FROM case_refs", [])?;
            tx.commit()?;
            Ok(removed)
        })?;

        tracing::warn!(removed, "offline queue wiped");
        Ok(removed)
    }
}

fn open_file_connection(path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = FULL;
         PRAGMA busy_timeout = 5000;",
    )?;
    run_migrations(&conn)?;
    tracing::debug!(path = %path.display(), "queue store opened");
    Ok(conn)
}

fn open_memory_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn ensure_exists(conn: &Connection, id: ActionId) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM offline_actions WHERE id = ?1",
        [id.0],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(Error::ActionNotFound(id.0))
    }
}

/// A `local:<id>` reference must name a `CREATE_CASE` action that is still
/// stored, or one whose server id is still remembered.
fn ensure_local_case(conn: &Connection, target: ActionId) -> Result<()> {
    let type_str: Option<String> = conn
        .query_row(
            "SELECT type FROM offline_actions WHERE id = ?1",
            [target.0],
            |row| row.get(0),
        )
        .optional()?;

    let known = match type_str {
        Some(t) => t.parse::<ActionType>()? == ActionType::CreateCase,
        None => conn.query_row(
            "SELECT COUNT(*) > 0 FROM case_refs WHERE action_id = ?1",
            [target.0],
            |row| row.get(0),
        )?,
    };

    if known {
        Ok(())
    } else {
        Err(Error::UnknownLocalCase(target.local_ref()))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
