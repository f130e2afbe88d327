//! Database migrations

use crate::error::Result;
use crate::util::now_ms;
use rusqlite::{params, Connection, OptionalExtension};

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Name of the root folder seeded into every new store
pub const DEFAULT_FOLDER_NAME: &str = "Default";

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .optional()?
        .flatten()
        .unwrap_or(0);

    Ok(version)
}

/// Migration to version 1: Initial schema
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Folder tree
        "CREATE TABLE IF NOT EXISTS folders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            parent_id INTEGER REFERENCES folders(id),
            is_read_only INTEGER NOT NULL DEFAULT 0,
            color TEXT,
            pinned_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_folders_name ON folders(name)",
        "CREATE INDEX IF NOT EXISTS idx_folders_parent ON folders(parent_id)",
        // Models, keyed by name
        "CREATE TABLE IF NOT EXISTS models (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            sort_order INTEGER NOT NULL DEFAULT 0,
            is_default INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE INDEX IF NOT EXISTS idx_models_order ON models(sort_order)",
        // Logs
        "CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            model_id INTEGER REFERENCES models(id),
            folder_id INTEGER REFERENCES folders(id),
            thread_id TEXT,
            thread_order INTEGER,
            pinned_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            CHECK (thread_id IS NULL OR thread_order IS NOT NULL)
        )",
        "CREATE INDEX IF NOT EXISTS idx_logs_title ON logs(title)",
        "CREATE INDEX IF NOT EXISTS idx_logs_created ON logs(created_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_logs_updated ON logs(updated_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_logs_folder ON logs(folder_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_logs_thread_order
            ON logs(thread_id, thread_order) WHERE thread_id IS NOT NULL",
        // Comments
        "CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_id INTEGER NOT NULL REFERENCES logs(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_comments_log ON comments(log_id, created_at)",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for stmt in statements {
        tx.execute(stmt, [])?;
    }

    let now = now_ms();
    tx.execute(
        "INSERT INTO folders (name, parent_id, is_read_only, created_at, updated_at)
         VALUES (?1, NULL, 0, ?2, ?2)",
        params![DEFAULT_FOLDER_NAME, now],
    )?;

    // Dropping the transaction on error rolls back
    tx.commit()?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let mut conn = setup();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap(); // Should not fail

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);

        let folders: i64 = conn
            .query_row("SELECT COUNT(*) FROM folders", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folders, 1);
    }

    #[test]
    fn test_seeds_root_default_folder() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        let (name, parent): (String, Option<i64>) = conn
            .query_row("SELECT name, parent_id FROM folders", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(name, DEFAULT_FOLDER_NAME);
        assert!(parent.is_none());
    }

    #[test]
    fn test_thread_order_unique_per_thread() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        let insert = "INSERT INTO logs (title, content, thread_id, thread_order, created_at, updated_at)
                      VALUES ('t', 'c', ?1, ?2, 0, 0)";
        conn.execute(insert, params!["thread-a", 0]).unwrap();
        conn.execute(insert, params!["thread-b", 0]).unwrap();
        assert!(conn.execute(insert, params!["thread-a", 0]).is_err());
    }
}
