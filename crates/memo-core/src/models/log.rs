//! Log (markdown note) model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{FolderId, LogId, ModelId};

/// A markdown note, optionally part of a conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Store-assigned identifier
    pub id: LogId,
    pub title: String,
    /// Markdown content, may embed fenced drawing/spreadsheet blocks
    pub content: String,
    /// Tag set, sorted and de-duplicated
    pub tags: Vec<String>,
    pub model_id: Option<ModelId>,
    pub folder_id: Option<FolderId>,
    /// Opaque grouping key shared by every log of one thread
    pub thread_id: Option<String>,
    /// Position inside the thread; unique per `thread_id`
    pub thread_order: Option<i64>,
    /// Pin timestamp (Unix ms)
    pub pinned_at: Option<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Log {
    /// Whether this log belongs to a thread
    #[must_use]
    pub const fn is_threaded(&self) -> bool {
        self.thread_id.is_some()
    }
}

/// Values for inserting a new log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLog {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub model_id: Option<ModelId>,
    pub folder_id: Option<FolderId>,
    pub thread_id: Option<String>,
    pub thread_order: Option<i64>,
    pub pinned_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewLog {
    /// An unthreaded log stamped with the current time
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = crate::util::now_ms();
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            model_id: None,
            folder_id: None,
            thread_id: None,
            thread_order: None,
            pinned_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Put the log into `thread_id` at `order`
    #[must_use]
    pub fn in_thread(mut self, thread_id: impl Into<String>, order: i64) -> Self {
        self.thread_id = Some(thread_id.into());
        self.thread_order = Some(order);
        self
    }

    #[must_use]
    pub const fn in_folder(mut self, folder_id: FolderId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    #[must_use]
    pub const fn at(mut self, created_at: i64, updated_at: i64) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }
}

/// Normalize a tag list into set form: trimmed, non-empty, sorted, unique
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
