//! Share-scope helpers: "this note", "this thread" or "everything".

use std::fmt;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{LogRepository, SqliteLogRepository};
use crate::error::Result;
use crate::models::{Log, LogId};

/// Label used when the whole store is exported
pub const FULL_SCOPE_LABEL: &str = "All Data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Single,
    Thread,
    Full,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::Thread => "thread",
            Self::Full => "full",
        })
    }
}

/// Summary of what an export would carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncScope {
    pub kind: ScopeKind,
    pub count: usize,
    pub label: String,
}

/// Thread members of `log`, head first, when `log` is the head of its thread
fn thread_if_head(repo: &SqliteLogRepository<'_>, log: &Log) -> Result<Option<Vec<Log>>> {
    let Some(thread_id) = log.thread_id.as_deref() else {
        return Ok(None);
    };
    let members = repo.list_thread(thread_id)?;
    let is_head = members.first().is_some_and(|head| head.id == log.id);
    Ok(is_head.then_some(members))
}

/// Describe the export scope implied by `focus`
pub fn analyze_sync_scope(conn: &Connection, focus: Option<LogId>) -> Result<SyncScope> {
    let repo = SqliteLogRepository::new(conn);

    if let Some(log) = focus.map(|id| repo.get(id)).transpose()?.flatten() {
        if let Some(members) = thread_if_head(&repo, &log)? {
            if members.len() > 1 {
                return Ok(SyncScope {
                    kind: ScopeKind::Thread,
                    count: members.len(),
                    label: log.title,
                });
            }
        }
        return Ok(SyncScope {
            kind: ScopeKind::Single,
            count: 1,
            label: log.title,
        });
    }

    Ok(SyncScope {
        kind: ScopeKind::Full,
        count: repo.count()?,
        label: FULL_SCOPE_LABEL.to_string(),
    })
}

/// Log ids to export for `focus`; `None` means the whole store
pub fn resolve_sync_scope(conn: &Connection, focus: Option<LogId>) -> Result<Option<Vec<LogId>>> {
    let repo = SqliteLogRepository::new(conn);

    let Some(log) = focus.map(|id| repo.get(id)).transpose()?.flatten() else {
        return Ok(None);
    };

    if let Some(members) = thread_if_head(&repo, &log)? {
        return Ok(Some(members.into_iter().map(|member| member.id).collect()));
    }
    Ok(Some(vec![log.id]))
}
