//! Log repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{normalize_tags, Log, LogId, NewLog};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

const LOG_COLUMNS: &str = "id, title, content, tags, model_id, folder_id, thread_id, \
                           thread_order, pinned_at, created_at, updated_at";

/// Trait for log storage operations
pub trait LogRepository {
    /// Insert a new log
    ///
    /// A threaded log keeps its requested `thread_order` when that slot is
    /// free in the thread; otherwise it is appended after the last member.
    fn create(&self, log: &NewLog) -> Result<Log>;

    /// Get a log by ID
    fn get(&self, id: LogId) -> Result<Option<Log>>;

    /// List logs, most recently updated first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Log>>;

    /// List every log in id order
    fn list_all(&self) -> Result<Vec<Log>>;

    /// Logs with exactly this title, in id order
    fn find_by_title(&self, title: &str) -> Result<Vec<Log>>;

    /// Members of a thread ordered by `thread_order`
    fn list_thread(&self, thread_id: &str) -> Result<Vec<Log>>;

    /// Total number of logs
    fn count(&self) -> Result<usize>;

    /// Write every mutable column of `log`, applying the thread slot rule
    fn update(&self, log: &Log) -> Result<Log>;
}

/// `SQLite` implementation of `LogRepository`
pub struct SqliteLogRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteLogRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a log from a database row
    fn parse_log(row: &rusqlite::Row<'_>) -> rusqlite::Result<Log> {
        let tags_json: String = row.get(3)?;
        let tags = serde_json::from_str::<Vec<String>>(&tags_json)
            .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(error)))?;

        Ok(Log {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            tags,
            model_id: row.get(4)?,
            folder_id: row.get(5)?,
            thread_id: row.get(6)?,
            thread_order: row.get(7)?,
            pinned_at: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn query_logs(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Log>> {
        let mut stmt = self.conn.prepare(sql)?;
        let logs = stmt
            .query_map(params, Self::parse_log)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    /// Pick the thread slot for a log entering or staying in `thread_id`
    fn claim_thread_order(
        &self,
        thread_id: &str,
        wanted: Option<i64>,
        owner: Option<LogId>,
    ) -> Result<i64> {
        if let Some(order) = wanted {
            let taken: bool = self.conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM logs
                     WHERE thread_id = ?1 AND thread_order = ?2 AND (?3 IS NULL OR id != ?3)
                 )",
                params![thread_id, order, owner],
                |row| row.get(0),
            )?;
            if !taken {
                return Ok(order);
            }
        }

        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(thread_order) FROM logs WHERE thread_id = ?1 AND (?2 IS NULL OR id != ?2)",
            params![thread_id, owner],
            |row| row.get(0),
        )?;
        let next = max.map_or(0, |max| max + 1);
        if wanted.is_some() {
            tracing::debug!(thread_id, next, "Thread slot taken, appending log to thread");
        }
        Ok(next)
    }

    fn encode_tags(tags: &[String]) -> Result<String> {
        Ok(serde_json::to_string(&normalize_tags(tags))?)
    }
}

impl LogRepository for SqliteLogRepository<'_> {
    fn create(&self, log: &NewLog) -> Result<Log> {
        let thread_order = match log.thread_id.as_deref() {
            Some(thread_id) => Some(self.claim_thread_order(thread_id, log.thread_order, None)?),
            None => None,
        };

        self.conn.execute(
            "INSERT INTO logs (title, content, tags, model_id, folder_id, thread_id, thread_order,
                               pinned_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                log.title,
                log.content,
                Self::encode_tags(&log.tags)?,
                log.model_id,
                log.folder_id,
                log.thread_id,
                thread_order,
                log.pinned_at,
                log.created_at,
                log.updated_at
            ],
        )?;

        let id = LogId::new(self.conn.last_insert_rowid());
        self.get(id)?
            .ok_or_else(|| Error::Database(format!("log {id} vanished after insert")))
    }

    fn get(&self, id: LogId) -> Result<Option<Log>> {
        let sql = format!("SELECT {LOG_COLUMNS} FROM logs WHERE id = ?");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::parse_log)
            .optional()?)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Log>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM logs ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        self.query_logs(&sql, params![limit as i64, offset as i64])
    }

    fn list_all(&self) -> Result<Vec<Log>> {
        let sql = format!("SELECT {LOG_COLUMNS} FROM logs ORDER BY id");
        self.query_logs(&sql, params![])
    }

    fn find_by_title(&self, title: &str) -> Result<Vec<Log>> {
        let sql = format!("SELECT {LOG_COLUMNS} FROM logs WHERE title = ? ORDER BY id");
        self.query_logs(&sql, params![title])
    }

    fn list_thread(&self, thread_id: &str) -> Result<Vec<Log>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM logs WHERE thread_id = ? ORDER BY thread_order, id"
        );
        self.query_logs(&sql, params![thread_id])
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| Error::Database(format!("invalid log count {count}")))
    }

    fn update(&self, log: &Log) -> Result<Log> {
        let thread_order = match log.thread_id.as_deref() {
            Some(thread_id) => {
                Some(self.claim_thread_order(thread_id, log.thread_order, Some(log.id))?)
            }
            None => None,
        };

        let rows = self.conn.execute(
            "UPDATE logs
             SET title = ?, content = ?, tags = ?, model_id = ?, folder_id = ?, thread_id = ?,
                 thread_order = ?, pinned_at = ?, updated_at = ?
             WHERE id = ?",
            params![
                log.title,
                log.content,
                Self::encode_tags(&log.tags)?,
                log.model_id,
                log.folder_id,
                log.thread_id,
                thread_order,
                log.pinned_at,
                log.updated_at,
                log.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(format!("log {}", log.id)));
        }

        self.get(log.id)?
            .ok_or_else(|| Error::NotFound(format!("log {}", log.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let db = setup();
        let repo = SqliteLogRepository::new(db.connection());

        let mut draft = NewLog::new("Hello", "# world");
        draft.tags = vec!["b".into(), "a".into(), "b".into()];
        let log = repo.create(&draft).unwrap();

        let fetched = repo.get(log.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Hello");
        assert_eq!(fetched.content, "# world");
        assert_eq!(fetched.tags, vec!["a", "b"]);
        assert!(fetched.thread_id.is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let db = setup();
        let repo = SqliteLogRepository::new(db.connection());

        repo.create(&NewLog::new("old", "").at(1_000, 1_000)).unwrap();
        repo.create(&NewLog::new("new", "").at(2_000, 3_000)).unwrap();

        let logs = repo.list(10, 0).unwrap();
        assert_eq!(logs[0].title, "new");
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_thread_slot_collision_appends() {
        let db = setup();
        let repo = SqliteLogRepository::new(db.connection());

        repo.create(&NewLog::new("head", "").in_thread("t", 0)).unwrap();
        repo.create(&NewLog::new("reply", "").in_thread("t", 1)).unwrap();
        let clash = repo.create(&NewLog::new("clash", "").in_thread("t", 0)).unwrap();

        assert_eq!(clash.thread_order, Some(2));
        let orders = repo
            .list_thread("t")
            .unwrap()
            .into_iter()
            .map(|log| (log.title, log.thread_order))
            .collect::<Vec<_>>();
        assert_eq!(
            orders,
            vec![
                ("head".to_string(), Some(0)),
                ("reply".to_string(), Some(1)),
                ("clash".to_string(), Some(2)),
            ]
        );
    }

    #[test]
    fn test_threaded_log_without_order_gets_next_slot() {
        let db = setup();
        let repo = SqliteLogRepository::new(db.connection());

        let mut draft = NewLog::new("first", "");
        draft.thread_id = Some("t".to_string());
        let log = repo.create(&draft).unwrap();
        assert_eq!(log.thread_order, Some(0));
    }

    #[test]
    fn test_update_keeps_own_slot() {
        let db = setup();
        let repo = SqliteLogRepository::new(db.connection());

        let mut head = repo.create(&NewLog::new("head", "").in_thread("t", 0)).unwrap();
        head.content = "edited".to_string();
        let updated = repo.update(&head).unwrap();

        assert_eq!(updated.thread_order, Some(0));
        assert_eq!(updated.content, "edited");
    }

    #[test]
    fn test_update_moving_into_thread_claims_slot() {
        let db = setup();
        let repo = SqliteLogRepository::new(db.connection());

        repo.create(&NewLog::new("head", "").in_thread("t", 0)).unwrap();
        let mut loose = repo.create(&NewLog::new("loose", "")).unwrap();
        loose.thread_id = Some("t".to_string());
        loose.thread_order = Some(0);

        let moved = repo.update(&loose).unwrap();
        assert_eq!(moved.thread_order, Some(1));
    }

    #[test]
    fn test_find_by_title_is_exact() {
        let db = setup();
        let repo = SqliteLogRepository::new(db.connection());

        repo.create(&NewLog::new("Note", "")).unwrap();
        repo.create(&NewLog::new("note", "")).unwrap();
        assert_eq!(repo.find_by_title("Note").unwrap().len(), 1);
    }
}
