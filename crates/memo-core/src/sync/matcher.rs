//! Identity matching between snapshot entities and local rows.
//!
//! Snapshot ids are foreign sequence numbers, so identity is inferred from
//! content: names for folders and models, title plus a creation-time window
//! for logs.

use crate::config::EngineConfig;
use crate::models::{Comment, Folder, Log, LogId, Model};
use crate::snapshot::{SnapshotComment, SnapshotFolder, SnapshotLog, SnapshotModel};
use crate::util::within_window;

/// Strategy used by the merge engine to pair incoming entities with local ones.
pub trait EntityMatcher {
    fn match_folder<'a>(&self, incoming: &SnapshotFolder, local: &'a [Folder]) -> Option<&'a Folder>;

    fn match_model<'a>(&self, incoming: &SnapshotModel, local: &'a [Model]) -> Option<&'a Model>;

    fn match_log<'a>(&self, incoming: &SnapshotLog, local: &'a [Log]) -> Option<&'a Log>;

    /// Whether an equivalent comment is already attached to `log_id`
    fn is_duplicate_comment(
        &self,
        incoming: &SnapshotComment,
        log_id: LogId,
        local: &[Comment],
    ) -> bool;
}

/// Name and time-window heuristics.
///
/// Two distinct logs sharing a title and created inside the window are
/// treated as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicMatcher {
    log_window_ms: i64,
    comment_window_ms: i64,
}

impl HeuristicMatcher {
    #[must_use]
    pub const fn new(log_window_ms: i64, comment_window_ms: i64) -> Self {
        Self {
            log_window_ms,
            comment_window_ms,
        }
    }

    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.log_match_window_ms, config.comment_dedup_window_ms)
    }
}

impl Default for HeuristicMatcher {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl EntityMatcher for HeuristicMatcher {
    fn match_folder<'a>(&self, incoming: &SnapshotFolder, local: &'a [Folder]) -> Option<&'a Folder> {
        local.iter().find(|folder| folder.name == incoming.name)
    }

    fn match_model<'a>(&self, incoming: &SnapshotModel, local: &'a [Model]) -> Option<&'a Model> {
        local.iter().find(|model| model.name == incoming.name)
    }

    fn match_log<'a>(&self, incoming: &SnapshotLog, local: &'a [Log]) -> Option<&'a Log> {
        local.iter().find(|log| {
            log.title == incoming.title
                && within_window(log.created_at, incoming.created_at, self.log_window_ms)
        })
    }

    fn is_duplicate_comment(
        &self,
        incoming: &SnapshotComment,
        log_id: LogId,
        local: &[Comment],
    ) -> bool {
        local.iter().any(|comment| {
            comment.log_id == log_id
                && comment.content == incoming.content
                && within_window(comment.created_at, incoming.created_at, self.comment_window_ms)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentId, FolderId, ModelId};

    fn local_log(id: i64, title: &str, created_at: i64) -> Log {
        Log {
            id: LogId::new(id),
            title: title.to_string(),
            content: String::new(),
            tags: Vec::new(),
            model_id: None,
            folder_id: None,
            thread_id: None,
            thread_order: None,
            pinned_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn incoming_log(title: &str, created_at: i64) -> SnapshotLog {
        SnapshotLog {
            id: 99,
            title: title.to_string(),
            content: String::new(),
            tags: Vec::new(),
            model_id: None,
            folder_id: None,
            thread_id: None,
            thread_order: None,
            pinned_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn log_window_is_exclusive() {
        let matcher = HeuristicMatcher::default();
        let local = vec![local_log(1, "Note", 10_000)];

        assert!(matcher.match_log(&incoming_log("Note", 14_999), &local).is_some());
        assert!(matcher.match_log(&incoming_log("Note", 5_001), &local).is_some());
        assert!(matcher.match_log(&incoming_log("Note", 15_000), &local).is_none());
        assert!(matcher.match_log(&incoming_log("Note", 15_001), &local).is_none());
    }

    #[test]
    fn log_title_must_be_byte_equal() {
        let matcher = HeuristicMatcher::default();
        let local = vec![local_log(1, "Note", 0)];
        assert!(matcher.match_log(&incoming_log("note", 0), &local).is_none());
        assert!(matcher.match_log(&incoming_log("Note ", 0), &local).is_none());
    }

    #[test]
    fn first_candidate_wins() {
        let matcher = HeuristicMatcher::default();
        let local = vec![local_log(1, "Note", 0), local_log(2, "Note", 100)];
        let found = matcher.match_log(&incoming_log("Note", 100), &local).unwrap();
        assert_eq!(found.id, LogId::new(1));
    }

    #[test]
    fn folders_and_models_match_by_name() {
        let matcher = HeuristicMatcher::default();
        let folders = vec![Folder {
            id: FolderId::new(4),
            name: "Work".to_string(),
            parent_id: None,
            is_read_only: false,
            color: None,
            pinned_at: None,
            created_at: 0,
            updated_at: 0,
        }];
        let models = vec![Model {
            id: ModelId::new(2),
            name: "GPT-4".to_string(),
            order: 0,
            is_default: false,
        }];

        let folder = SnapshotFolder {
            id: 1,
            name: "Work".to_string(),
            parent_id: None,
            is_read_only: false,
            color: None,
            pinned_at: None,
            created_at: 0,
            updated_at: 0,
        };
        let model = SnapshotModel {
            id: 7,
            name: "gpt-4".to_string(),
            order: None,
            is_default: false,
        };

        assert_eq!(
            matcher.match_folder(&folder, &folders).map(|found| found.id),
            Some(FolderId::new(4))
        );
        assert!(matcher.match_model(&model, &models).is_none());
    }

    #[test]
    fn comment_dedup_uses_its_own_window() {
        let matcher = HeuristicMatcher::default();
        let log_id = LogId::new(1);
        let local = vec![Comment {
            id: CommentId::new(1),
            log_id,
            content: "nice".to_string(),
            created_at: 10_000,
            updated_at: 10_000,
        }];
        let incoming = |created_at| SnapshotComment {
            id: 5,
            log_id: 42,
            content: "nice".to_string(),
            created_at,
            updated_at: created_at,
        };

        assert!(matcher.is_duplicate_comment(&incoming(10_999), log_id, &local));
        assert!(!matcher.is_duplicate_comment(&incoming(11_000), log_id, &local));
        assert!(!matcher.is_duplicate_comment(&incoming(10_000), LogId::new(2), &local));
    }
}
