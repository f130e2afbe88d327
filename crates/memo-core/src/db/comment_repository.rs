//! Comment repository implementation

use crate::error::{Error, Result};
use crate::models::{Comment, CommentId, LogId, NewComment};
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for comment storage operations
pub trait CommentRepository {
    /// Insert a new comment
    fn create(&self, comment: &NewComment) -> Result<Comment>;

    fn get(&self, id: CommentId) -> Result<Option<Comment>>;

    /// Comments of one log, oldest first
    fn list_for_log(&self, log_id: LogId) -> Result<Vec<Comment>>;

    /// Every comment in id order
    fn list_all(&self) -> Result<Vec<Comment>>;
}

/// `SQLite` implementation of `CommentRepository`
pub struct SqliteCommentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCommentRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get(0)?,
            log_id: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create(&self, comment: &NewComment) -> Result<Comment> {
        self.conn.execute(
            "INSERT INTO comments (log_id, content, created_at, updated_at) VALUES (?, ?, ?, ?)",
            params![
                comment.log_id,
                comment.content,
                comment.created_at,
                comment.updated_at
            ],
        )?;

        let id = CommentId::new(self.conn.last_insert_rowid());
        self.get(id)?
            .ok_or_else(|| Error::Database(format!("comment {id} vanished after insert")))
    }

    fn get(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, log_id, content, created_at, updated_at FROM comments WHERE id = ?",
                params![id],
                Self::parse_comment,
            )
            .optional()?)
    }

    fn list_for_log(&self, log_id: LogId) -> Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, log_id, content, created_at, updated_at
             FROM comments
             WHERE log_id = ?
             ORDER BY created_at, id",
        )?;
        let comments = stmt
            .query_map(params![log_id], Self::parse_comment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    fn list_all(&self) -> Result<Vec<Comment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, log_id, content, created_at, updated_at FROM comments ORDER BY id")?;
        let comments = stmt
            .query_map([], Self::parse_comment)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, LogRepository, SqliteLogRepository};
    use crate::models::NewLog;

    #[test]
    fn test_create_and_list_for_log() {
        let db = Database::open_in_memory().unwrap();
        let logs = SqliteLogRepository::new(db.connection());
        let repo = SqliteCommentRepository::new(db.connection());

        let log = logs.create(&NewLog::new("Log", "body")).unwrap();
        let mut later = NewComment::new(log.id, "second");
        later.created_at = 2_000;
        repo.create(&later).unwrap();
        let mut earlier = NewComment::new(log.id, "first");
        earlier.created_at = 1_000;
        repo.create(&earlier).unwrap();

        let contents = repo
            .list_for_log(log.id)
            .unwrap()
            .into_iter()
            .map(|comment| comment.content)
            .collect::<Vec<_>>();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_rejects_unknown_log() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteCommentRepository::new(db.connection());

        let result = repo.create(&NewComment::new(LogId::new(404), "orphan"));
        assert!(result.is_err());
    }
}
