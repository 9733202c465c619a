//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{CatalogEntry, DependencyKind, DependencyRef};
use crate::storage::codec::{compress, decompress};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

/// Columns of an `entries` row before the compressed fields are decoded
struct EntryRow {
    id: i64,
    name: String,
    description: Option<String>,
    version: Option<String>,
    publication_date: Option<String>,
    requires_compilation: Option<bool>,
    in_primary_repo: bool,
    in_secondary_repo: Option<bool>,
    maintainer: Option<String>,
    authors: Option<String>,
    license: Option<String>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Writes a new entry and its relations, committing only at the end
    fn store_in_transaction(&mut self, entry: &mut CatalogEntry) -> StorageResult<i64> {
        if entry.name.trim().is_empty() {
            return Err(StorageError::InvalidEntry(
                "entry name is empty".to_string(),
            ));
        }

        let description = entry.description.as_deref().map(compress).transpose()?;
        let authors = entry.authors.as_deref().map(compress).transpose()?;

        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM entries WHERE name = ?1",
                params![entry.name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            tracing::debug!("Entry '{}' already stored with id {}", entry.name, id);
            entry.id = Some(id);
            return Ok(id);
        }

        tx.execute(
            "INSERT INTO entries (name, description, version, publication_date,
             requires_compilation, in_primary_repo, in_secondary_repo, maintainer, authors, license)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                entry.name,
                description,
                entry.version,
                entry.publication_date,
                entry.requires_compilation,
                entry.present_in_primary_repo,
                entry.present_in_secondary_repo,
                entry.maintainer,
                authors,
                entry.licenses,
            ],
        )?;
        let entry_id = tx.last_insert_rowid();

        for url in entry.links() {
            tx.execute("INSERT INTO links (url) VALUES (?1)", params![url])?;
            let link_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO entry_link (entry_id, link_id) VALUES (?1, ?2)",
                params![entry_id, link_id],
            )?;
        }

        let mut dependency_ids = Vec::with_capacity(entry.dependencies().len());
        for dependency in entry.dependencies() {
            let kind = dependency.kind.to_db_string();
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM dependencies
                     WHERE name = ?1 AND version_constraint IS ?2 AND kind = ?3",
                    params![dependency.name, dependency.version_constraint, kind],
                    |row| row.get(0),
                )
                .optional()?;

            let dependency_id = match existing {
                Some(id) => id,
                None => {
                    tx.execute(
                        "INSERT INTO dependencies (name, version_constraint, kind) VALUES (?1, ?2, ?3)",
                        params![dependency.name, dependency.version_constraint, kind],
                    )?;
                    tx.last_insert_rowid()
                }
            };

            tx.execute(
                "INSERT OR IGNORE INTO entry_dependency (entry_id, dependency_id) VALUES (?1, ?2)",
                params![entry_id, dependency_id],
            )?;
            dependency_ids.push(dependency_id);
        }

        tx.commit()?;

        entry.id = Some(entry_id);
        for (dependency, id) in entry.dependencies_mut().iter_mut().zip(dependency_ids) {
            dependency.id = Some(id);
            dependency.entry_id = Some(entry_id);
        }

        Ok(entry_id)
    }

    fn load_dependencies(&self, entry_id: i64) -> StorageResult<Vec<DependencyRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.name, d.version_constraint, d.kind
             FROM entry_dependency ed
             JOIN dependencies d ON d.id = ed.dependency_id
             WHERE ed.entry_id = ?1
             ORDER BY ed.rowid",
        )?;

        let rows = stmt
            .query_map(params![entry_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, constraint, kind)| {
                let kind = DependencyKind::from_db_string(&kind).ok_or_else(|| {
                    StorageError::Corrupt(format!("unknown dependency kind '{}'", kind))
                })?;
                let mut dependency = DependencyRef::new(name, constraint, kind);
                dependency.id = Some(id);
                dependency.entry_id = Some(entry_id);
                Ok(dependency)
            })
            .collect()
    }

    fn load_links(&self, entry_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.url
             FROM entry_link el
             JOIN links l ON l.id = el.link_id
             WHERE el.entry_id = ?1
             ORDER BY el.rowid",
        )?;

        let links = stmt
            .query_map(params![entry_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(links)
    }

    fn count(&self, table: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn entry_row(row: &Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        version: row.get(3)?,
        publication_date: row.get(4)?,
        requires_compilation: row.get(5)?,
        in_primary_repo: row.get(6)?,
        in_secondary_repo: row.get(7)?,
        maintainer: row.get(8)?,
        authors: row.get(9)?,
        license: row.get(10)?,
    })
}

/// Columns of a `runs` row before the status string is checked
struct RunRow {
    id: i64,
    started_at: String,
    finished_at: Option<String>,
    config_hash: String,
    status: String,
    entries_stored: i64,
}

impl RunRow {
    fn into_record(self) -> StorageResult<RunRecord> {
        let status = RunStatus::from_db_string(&self.status).ok_or_else(|| {
            StorageError::Corrupt(format!(
                "unknown status '{}' for run {}",
                self.status, self.id
            ))
        })?;

        Ok(RunRecord {
            id: self.id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            config_hash: self.config_hash,
            status,
            entries_stored: self.entries_stored as u64,
        })
    }
}

fn run_row(row: &Row<'_>) -> rusqlite::Result<RunRow> {
    Ok(RunRow {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: row.get(4)?,
        entries_stored: row.get(5)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Entries =====

    fn exists(&self, name: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM entries WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn load(&self, name: &str) -> StorageResult<CatalogEntry> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, description, version, publication_date, requires_compilation,
                 in_primary_repo, in_secondary_repo, maintainer, authors, license
                 FROM entries WHERE name = ?1",
                params![name],
                entry_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;

        let mut entry = CatalogEntry::new(row.name);
        entry.id = Some(row.id);
        entry.description = row.description.as_deref().map(decompress).transpose()?;
        entry.version = row.version;
        entry.publication_date = row.publication_date;
        entry.requires_compilation = row.requires_compilation;
        entry.present_in_primary_repo = row.in_primary_repo;
        entry.present_in_secondary_repo = row.in_secondary_repo;
        entry.maintainer = row.maintainer;
        entry.authors = row.authors.as_deref().map(decompress).transpose()?;
        entry.licenses = row.license;

        for dependency in self.load_dependencies(row.id)? {
            entry.add_dependency(dependency);
        }
        for link in self.load_links(row.id)? {
            entry.add_link(link);
        }

        Ok(entry)
    }

    fn store(&mut self, entry: &mut CatalogEntry) -> StorageResult<i64> {
        let name = entry.name.clone();
        self.store_in_transaction(entry)
            .map_err(|e| StorageError::StoreFailed {
                name,
                source: Box::new(e),
            })
    }

    // ===== Statistics =====

    fn count_entries(&self) -> StorageResult<u64> {
        self.count("entries")
    }

    fn count_dependencies(&self) -> StorageResult<u64> {
        self.count("dependencies")
    }

    fn count_links(&self) -> StorageResult<u64> {
        self.count("links")
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, entries_stored
                 FROM runs WHERE id = ?1",
                params![run_id],
                run_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?
            .into_record()
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, entries_stored
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_row,
            )
            .optional()?;
        run.map(RunRow::into_record).transpose()
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        entries_stored: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, entries_stored = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, entries_stored as i64, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}
