use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{FunctionNameRecord, ImportKind, ImportRecord};
use crate::model::{FunctionLabelRecord, FunctionMatchRecord};
use crate::services::filter::FilterMode;
use crate::services::resolution::ResolutionStore;
use crate::services::selection::SelectionState;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

const SETTING_THRESHOLD: &str = "threshold";
const SETTING_FILTER: &str = "filter";

/// Error type for project database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// A stored value could not be decoded.
    #[error("Corrupt value in column {column}: {value}")]
    Corrupt { column: &'static str, value: String },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// Persisted threshold/filter choice of the last session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoredSettings {
    pub threshold: Option<i64>,
    pub filter: Option<FilterMode>,
}

// SQLite integers are signed; offsets and ids round-trip through a bit cast.
fn to_sql_id(value: u64) -> i64 {
    value as i64
}

fn from_sql_id(value: i64) -> u64 {
    value as u64
}

/// SQLite-backed project database.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Storing imported match data and the analyst's session state.
#[derive(Debug)]
pub struct ProjectDb {
    conn: Connection,
}

impl ProjectDb {
    /// Open (or create) a project database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace all stored match records.
    pub fn replace_matches(&mut self, matches: &[FunctionMatchRecord]) -> DbResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM matches", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO matches (local_function_id, local_offset, matched_family_id,
                                     matched_sample_id, matched_function_id, matched_score,
                                     is_library_match)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for m in matches {
                stmt.execute(params![
                    to_sql_id(m.local_function_id),
                    to_sql_id(m.local_offset),
                    to_sql_id(m.matched_family_id),
                    to_sql_id(m.matched_sample_id),
                    to_sql_id(m.matched_function_id),
                    m.matched_score,
                    m.is_library_match,
                ])?;
            }
        }
        tx.commit()?;
        Ok(matches.len())
    }

    /// List match records in insertion order.
    pub fn list_matches(&self) -> DbResult<Vec<FunctionMatchRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT local_function_id, local_offset, matched_family_id, matched_sample_id,
                   matched_function_id, matched_score, is_library_match
            FROM matches
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FunctionMatchRecord {
                local_function_id: from_sql_id(row.get(0)?),
                local_offset: from_sql_id(row.get(1)?),
                matched_family_id: from_sql_id(row.get(2)?),
                matched_sample_id: from_sql_id(row.get(3)?),
                matched_function_id: from_sql_id(row.get(4)?),
                matched_score: row.get(5)?,
                is_library_match: row.get(6)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Replace all stored label records.
    pub fn replace_labels(&mut self, labels: &[FunctionLabelRecord]) -> DbResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM labels", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO labels (function_id, label_text, username, timestamp)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for label in labels {
                stmt.execute(params![
                    to_sql_id(label.function_id),
                    label.label_text,
                    label.username,
                    label.timestamp,
                ])?;
            }
        }
        tx.commit()?;
        Ok(labels.len())
    }

    /// List label records in insertion order.
    pub fn list_labels(&self) -> DbResult<Vec<FunctionLabelRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT function_id, label_text, username, timestamp
            FROM labels
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FunctionLabelRecord {
                function_id: from_sql_id(row.get(0)?),
                label_text: row.get(1)?,
                username: row.get(2)?,
                timestamp: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Replace the host function name snapshot.
    pub fn replace_function_names(&mut self, names: &[FunctionNameRecord]) -> DbResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM function_names", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO function_names (offset, name) VALUES (?1, ?2)",
            )?;
            for record in names {
                stmt.execute(params![to_sql_id(record.offset), record.name])?;
            }
        }
        tx.commit()?;
        Ok(names.len())
    }

    /// Update (or insert) a single function name.
    pub fn set_function_name(&self, offset: u64, name: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO function_names (offset, name) VALUES (?1, ?2)",
            params![to_sql_id(offset), name],
        )?;
        Ok(())
    }

    /// List function names ordered by offset.
    pub fn list_function_names(&self) -> DbResult<Vec<FunctionNameRecord>> {
        let mut stmt =
            self.conn.prepare("SELECT offset, name FROM function_names ORDER BY offset")?;
        let rows = stmt.query_map([], |row| {
            Ok(FunctionNameRecord { offset: from_sql_id(row.get(0)?), name: row.get(1)? })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Persist the selection state, replacing what was stored.
    pub fn save_selection(&mut self, selection: &SelectionState) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM selections", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO selections (offset, value) VALUES (?1, ?2)")?;
            for (offset, value) in selection.iter() {
                stmt.execute(params![to_sql_id(offset), value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_selection(&self) -> DbResult<SelectionState> {
        let mut stmt = self.conn.prepare("SELECT offset, value FROM selections ORDER BY offset")?;
        let rows = stmt.query_map([], |row| {
            Ok((from_sql_id(row.get(0)?), row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out.into_iter().collect())
    }

    /// Persist the resolution store, replacing what was stored.
    pub fn save_resolutions(&mut self, resolutions: &ResolutionStore) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM resolutions", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO resolutions (offset, label) VALUES (?1, ?2)")?;
            for (offset, label) in resolutions.iter() {
                stmt.execute(params![to_sql_id(offset), label])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_resolutions(&self) -> DbResult<ResolutionStore> {
        let mut stmt = self.conn.prepare("SELECT offset, label FROM resolutions ORDER BY offset")?;
        let rows = stmt.query_map([], |row| {
            Ok((from_sql_id(row.get(0)?), row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out.into_iter().collect())
    }

    fn set_setting(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session_settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_setting(&self, key: &str) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM session_settings WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Remember the threshold and filter of the last session.
    pub fn save_settings(&self, threshold: i64, filter: FilterMode) -> DbResult<()> {
        self.set_setting(SETTING_THRESHOLD, &threshold.to_string())?;
        self.set_setting(SETTING_FILTER, filter.as_str())?;
        Ok(())
    }

    pub fn load_settings(&self) -> DbResult<StoredSettings> {
        let threshold = match self.get_setting(SETTING_THRESHOLD)? {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| DbError::Corrupt { column: "session_settings.value", value: raw })?,
            ),
            None => None,
        };
        let filter = match self.get_setting(SETTING_FILTER)? {
            Some(raw) => Some(
                raw.parse::<FilterMode>()
                    .map_err(|_| DbError::Corrupt { column: "session_settings.value", value: raw })?,
            ),
            None => None,
        };
        Ok(StoredSettings { threshold, filter })
    }

    /// Insert an import record and return its row id.
    pub fn insert_import(&self, record: &ImportRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO imports (kind, source_path, source_hash, records, imported_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.kind.as_str(),
                record.source_path,
                record.source_hash,
                record.records as i64,
                record.imported_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List import records, optionally filtered by kind.
    pub fn list_imports(&self, kind: Option<ImportKind>) -> DbResult<Vec<ImportRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT kind, source_path, source_hash, records, imported_at
            FROM imports
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (raw_kind, source_path, source_hash, records, imported_at) = row?;
            let parsed = raw_kind
                .parse::<ImportKind>()
                .map_err(|_| DbError::Corrupt { column: "imports.kind", value: raw_kind })?;
            if kind.is_some_and(|wanted| wanted != parsed) {
                continue;
            }
            out.push(ImportRecord {
                kind: parsed,
                source_path,
                source_hash,
                records: records.max(0) as usize,
                imported_at,
            });
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: imported data (matches, labels, function_names)
/// - 2: session state (selections, resolutions, session_settings) and imports
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS matches (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                local_function_id   INTEGER NOT NULL,
                local_offset        INTEGER NOT NULL,
                matched_family_id   INTEGER NOT NULL,
                matched_sample_id   INTEGER NOT NULL,
                matched_function_id INTEGER NOT NULL,
                matched_score       REAL NOT NULL,
                is_library_match    INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS labels (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                function_id INTEGER NOT NULL,
                label_text  TEXT NOT NULL,
                username    TEXT NOT NULL DEFAULT '',
                timestamp   TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS function_names (
                offset INTEGER PRIMARY KEY,
                name   TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS selections (
                offset INTEGER PRIMARY KEY,
                value  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS resolutions (
                offset INTEGER PRIMARY KEY,
                label  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS session_settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS imports (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                kind        TEXT NOT NULL,
                source_path TEXT NOT NULL,
                source_hash TEXT,
                records     INTEGER NOT NULL,
                imported_at TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
