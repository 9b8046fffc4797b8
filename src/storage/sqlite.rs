//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ContributionStore trait.

use crate::contribution::{Contribution, ContributionKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ContributionStore, StorageError, StorageResult};
use crate::storage::{InsertOutcome, QueryResult};
use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

/// Extended result code SQLite reports for a PRIMARY KEY collision
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = "SELECT ref, name, type, description, url, author, uploadedon, \
     showcase, version, title, homepage, legacy FROM contributions";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file (created if missing)
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Raw column values of one contributions row, converted outside the row closure
struct ContributionRow {
    reference: String,
    name: String,
    contribution_type: String,
    description: String,
    source_url: String,
    author: String,
    uploaded_on: String,
    showcase_enabled: bool,
    version: String,
    title: String,
    homepage: String,
    legacy: bool,
}

impl ContributionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            reference: row.get(0)?,
            name: row.get(1)?,
            contribution_type: row.get(2)?,
            description: row.get(3)?,
            source_url: row.get(4)?,
            author: row.get(5)?,
            uploaded_on: row.get(6)?,
            showcase_enabled: row.get(7)?,
            version: row.get(8)?,
            title: row.get(9)?,
            homepage: row.get(10)?,
            legacy: row.get(11)?,
        })
    }

    fn into_contribution(self) -> StorageResult<Contribution> {
        let contribution_type = ContributionKind::from_db_string(&self.contribution_type)
            .ok_or_else(|| StorageError::Corrupt {
                reference: self.reference.clone(),
                message: format!("unknown type '{}'", self.contribution_type),
            })?;

        let uploaded_on = NaiveDate::parse_from_str(&self.uploaded_on, DATE_FORMAT).map_err(|e| {
            StorageError::Corrupt {
                reference: self.reference.clone(),
                message: format!("bad upload date '{}': {}", self.uploaded_on, e),
            }
        })?;

        Ok(Contribution {
            reference: self.reference,
            name: self.name,
            contribution_type,
            description: self.description,
            source_url: self.source_url,
            author: self.author,
            uploaded_on,
            showcase_enabled: self.showcase_enabled,
            version: self.version,
            title: self.title,
            homepage: self.homepage,
            legacy: self.legacy,
        })
    }
}

fn is_primary_key_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

impl ContributionStore for SqliteStorage {
    // ===== Writes =====

    fn insert_contribution(&mut self, c: &Contribution) -> StorageResult<InsertOutcome> {
        let result = self.conn.execute(
            "INSERT INTO contributions (ref, name, type, description, url, author, uploadedon,
             showcase, version, title, homepage, legacy)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                c.reference,
                c.name,
                c.contribution_type.to_db_string(),
                c.description,
                c.source_url,
                c.author,
                c.uploaded_on.format(DATE_FORMAT).to_string(),
                c.showcase_enabled,
                c.version,
                c.title,
                c.homepage,
                c.legacy
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_primary_key_conflict(&e) => Ok(InsertOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    fn update_contribution(&mut self, c: &Contribution) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "UPDATE contributions SET type = ?1, description = ?2, url = ?3, uploadedon = ?4,
             showcase = ?5 WHERE ref = ?6",
            params![
                c.contribution_type.to_db_string(),
                c.description,
                c.source_url,
                c.uploaded_on.format(DATE_FORMAT).to_string(),
                c.showcase_enabled,
                c.reference
            ],
        )?;
        Ok(changed > 0)
    }

    // ===== Reads =====

    fn get_contribution(&self, reference: &str) -> StorageResult<Option<Contribution>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE ref = ?1", SELECT_COLUMNS))?;

        let row = stmt
            .query_row(params![reference], ContributionRow::from_row)
            .optional()?;

        row.map(ContributionRow::into_contribution).transpose()
    }

    fn list_contributions(&self) -> StorageResult<Vec<Contribution>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY ref", SELECT_COLUMNS))?;

        let rows = stmt
            .query_map([], ContributionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(ContributionRow::into_contribution)
            .collect()
    }

    fn count_contributions(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contributions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn query(&self, sql: &str) -> StorageResult<QueryResult> {
        let mut stmt = self.conn.prepare(sql)?;

        if !stmt.readonly() {
            return Err(StorageError::NotReadOnly(sql.to_string()));
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let column_count = columns.len();

        let mut result_rows = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(render_value(row.get_ref(idx)?));
            }
            result_rows.push(values);
        }

        Ok(QueryResult {
            columns,
            rows: result_rows,
        })
    }

    // ===== Statistics =====

    fn top_authors(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT author, COUNT(*) AS num FROM contributions
             GROUP BY author ORDER BY num DESC, author ASC LIMIT ?1",
        )?;

        let authors = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(authors)
    }

    fn count_by_type(&self) -> StorageResult<Vec<(ContributionKind, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT type, COUNT(*) FROM contributions GROUP BY type ORDER BY type")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (type_str, count) = row?;
            match ContributionKind::from_db_string(&type_str) {
                Some(kind) => counts.push((kind, count as u64)),
                None => tracing::warn!("Ignoring unknown contribution type '{}'", type_str),
            }
        }

        Ok(counts)
    }
}
