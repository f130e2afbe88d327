//! Export assembler: local store to snapshot.

use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

use crate::db::{
    CommentRepository, FolderRepository, LogRepository, ModelRepository, SqliteCommentRepository,
    SqliteFolderRepository, SqliteLogRepository, SqliteModelRepository,
};
use crate::error::Result;
use crate::models::{Comment, Folder, Log, LogId, Model};
use crate::snapshot::{
    Snapshot, SnapshotComment, SnapshotFolder, SnapshotLog, SnapshotModel, SNAPSHOT_VERSION,
};

/// Which logs an export carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFilter {
    /// Only these logs; `None` or an empty list exports every log
    pub include: Option<Vec<LogId>>,
    /// Never these logs
    pub exclude: Vec<LogId>,
}

impl ExportFilter {
    /// Export everything
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn only(ids: impl IntoIterator<Item = LogId>) -> Self {
        Self {
            include: Some(ids.into_iter().collect()),
            exclude: Vec::new(),
        }
    }

    #[must_use]
    pub fn excluding(mut self, ids: impl IntoIterator<Item = LogId>) -> Self {
        self.exclude.extend(ids);
        self
    }

    /// Whether the export leaves any log out
    pub fn is_partial(&self) -> bool {
        self.include.as_ref().is_some_and(|ids| !ids.is_empty()) || !self.exclude.is_empty()
    }
}

fn admits(include: Option<&HashSet<LogId>>, exclude: &HashSet<LogId>, id: LogId) -> bool {
    include.map_or(true, |ids| ids.contains(&id)) && !exclude.contains(&id)
}

/// Serialize the local store, or a subset of its logs, as a snapshot.
///
/// Folders and models are always exported in full so every reference in
/// the exported logs can be resolved. Comments follow their logs.
pub fn export_snapshot(conn: &Connection, filter: &ExportFilter) -> Result<Snapshot> {
    let include = filter
        .include
        .as_ref()
        .filter(|ids| !ids.is_empty())
        .map(|ids| ids.iter().copied().collect::<HashSet<_>>());
    let exclude = filter.exclude.iter().copied().collect::<HashSet<_>>();

    let logs = SqliteLogRepository::new(conn)
        .list_all()?
        .into_iter()
        .filter(|log| admits(include.as_ref(), &exclude, log.id))
        .collect::<Vec<_>>();
    let exported = logs.iter().map(|log| log.id).collect::<HashSet<_>>();

    let comments = SqliteCommentRepository::new(conn)
        .list_all()?
        .into_iter()
        .filter(|comment| exported.contains(&comment.log_id))
        .map(|comment| SnapshotComment::from(&comment))
        .collect();

    let folders = SqliteFolderRepository::new(conn)
        .list()?
        .iter()
        .map(SnapshotFolder::from)
        .collect();
    let models = SqliteModelRepository::new(conn)
        .list()?
        .iter()
        .map(SnapshotModel::from)
        .collect();

    tracing::info!(
        "Exported {} logs{}",
        logs.len(),
        if filter.is_partial() { " (partial)" } else { "" }
    );

    Ok(Snapshot {
        version: SNAPSHOT_VERSION,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        logs: logs.iter().map(SnapshotLog::from).collect(),
        models,
        comments,
        folders,
    })
}

impl From<&Folder> for SnapshotFolder {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id.get(),
            name: folder.name.clone(),
            parent_id: folder.parent_id.map(crate::models::FolderId::get),
            is_read_only: folder.is_read_only,
            color: folder.color.clone(),
            pinned_at: folder.pinned_at,
            created_at: folder.created_at,
            updated_at: folder.updated_at,
        }
    }
}

impl From<&Model> for SnapshotModel {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id.get(),
            name: model.name.clone(),
            order: Some(model.order),
            is_default: model.is_default,
        }
    }
}

impl From<&Log> for SnapshotLog {
    fn from(log: &Log) -> Self {
        Self {
            id: log.id.get(),
            title: log.title.clone(),
            content: log.content.clone(),
            tags: log.tags.clone(),
            model_id: log.model_id.map(crate::models::ModelId::get),
            folder_id: log.folder_id.map(crate::models::FolderId::get),
            thread_id: log.thread_id.clone(),
            thread_order: log.thread_order,
            pinned_at: log.pinned_at,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

impl From<&Comment> for SnapshotComment {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id.get(),
            log_id: comment.log_id.get(),
            content: comment.content.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}
