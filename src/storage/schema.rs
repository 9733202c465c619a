//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Catalog-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    entries_stored INTEGER NOT NULL DEFAULT 0
);

-- One row per catalog entry; description and authors are compressed
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    version TEXT,
    publication_date TEXT,
    requires_compilation INTEGER,
    in_primary_repo INTEGER NOT NULL DEFAULT 1,
    in_secondary_repo INTEGER,
    maintainer TEXT,
    authors TEXT,
    license TEXT
);

-- Dependencies are shared between entries
CREATE TABLE IF NOT EXISTS dependencies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    version_constraint TEXT,
    kind TEXT NOT NULL,
    UNIQUE(name, version_constraint, kind)
);

CREATE INDEX IF NOT EXISTS idx_dependencies_name ON dependencies(name);

CREATE TABLE IF NOT EXISTS entry_dependency (
    entry_id INTEGER NOT NULL REFERENCES entries(id),
    dependency_id INTEGER NOT NULL REFERENCES dependencies(id),
    PRIMARY KEY(entry_id, dependency_id)
);

CREATE INDEX IF NOT EXISTS idx_entry_dependency_dependency ON entry_dependency(dependency_id);

CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entry_link (
    entry_id INTEGER NOT NULL REFERENCES entries(id),
    link_id INTEGER NOT NULL REFERENCES links(id),
    PRIMARY KEY(entry_id, link_id)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in [
            "runs",
            "entries",
            "dependencies",
            "entry_dependency",
            "links",
            "entry_link",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_entry_name_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute("INSERT INTO entries (name) VALUES ('abc')", [])
            .unwrap();
        assert!(conn
            .execute("INSERT INTO entries (name) VALUES ('abc')", [])
            .is_err());
    }
}
