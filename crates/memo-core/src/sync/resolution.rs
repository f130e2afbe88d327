//! Per-log outcome of a merge.

use crate::models::SyncResolution;

/// What the merge does with one incoming log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDecision {
    /// No local match: insert as a new log
    Insert,
    /// Leave the matched local log untouched
    KeepLocal,
    /// Overwrite the matched local log unconditionally
    TakeRemote,
    /// Keep local and insert the incoming log as a detached copy
    Duplicate,
    /// Overwrite only when the incoming `updated_at` is strictly newer
    LastWriteWins,
}

impl LogDecision {
    /// Pick the decision for one incoming log.
    ///
    /// A caller-supplied resolution takes precedence; matched logs without
    /// one fall back to last-write-wins.
    #[must_use]
    pub const fn decide(matched: bool, resolution: Option<SyncResolution>) -> Self {
        match (matched, resolution) {
            (false, _) => Self::Insert,
            (true, Some(SyncResolution::Local)) => Self::KeepLocal,
            (true, Some(SyncResolution::Remote)) => Self::TakeRemote,
            (true, Some(SyncResolution::Both)) => Self::Duplicate,
            (true, None) => Self::LastWriteWins,
        }
    }

    /// Whether the local log should receive the incoming fields
    #[must_use]
    pub const fn overwrites(self, local_updated_at: i64, remote_updated_at: i64) -> bool {
        match self {
            Self::TakeRemote => true,
            Self::LastWriteWins => remote_updated_at > local_updated_at,
            Self::Insert | Self::KeepLocal | Self::Duplicate => false,
        }
    }
}
