//! Comment model

use serde::{Deserialize, Serialize};

use super::{CommentId, LogId};

/// A comment attached to a log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub log_id: LogId,
    pub content: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

/// Values for inserting a new comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub log_id: LogId,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewComment {
    #[must_use]
    pub fn new(log_id: LogId, content: impl Into<String>) -> Self {
        let now = crate::util::now_ms();
        Self {
            log_id,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
