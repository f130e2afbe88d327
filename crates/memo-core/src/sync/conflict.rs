//! Conflict detection and the external resolver seam.

use std::collections::HashMap;

use super::EntityMatcher;
use crate::error::Result;
use crate::models::{Log, SyncConflict, SyncResolution};
use crate::snapshot::SnapshotLog;

/// Conflicts found in one snapshot, in incoming-log order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSet {
    conflicts: Vec<SyncConflict>,
    by_incoming: HashMap<usize, usize>,
}

impl ConflictSet {
    pub fn conflicts(&self) -> &[SyncConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Position in the conflict list of the incoming log at `incoming_index`
    pub fn position_of(&self, incoming_index: usize) -> Option<usize> {
        self.by_incoming.get(&incoming_index).copied()
    }

    pub fn into_conflicts(self) -> Vec<SyncConflict> {
        self.conflicts
    }
}

/// Pair every incoming log with its local match and collect content
/// divergences. Only content is compared; title and tag differences are
/// settled by the resolution policy.
pub fn detect_conflicts<M: EntityMatcher>(
    matcher: &M,
    incoming: &[SnapshotLog],
    local: &[Log],
) -> ConflictSet {
    let mut set = ConflictSet::default();

    for (index, log) in incoming.iter().enumerate() {
        let Some(existing) = matcher.match_log(log, local) else {
            continue;
        };
        if existing.content == log.content {
            continue;
        }

        set.by_incoming.insert(index, set.conflicts.len());
        set.conflicts.push(SyncConflict {
            title: log.title.clone(),
            local_id: existing.id,
            local_updated_at: existing.updated_at,
            remote_updated_at: log.updated_at,
            local_content: existing.content.clone(),
            remote_content: log.content.clone(),
        });
    }

    set
}

/// External collaborator that adjudicates conflicts, typically by asking a
/// person. Must return exactly one resolution per conflict, in order.
#[allow(async_fn_in_trait)]
pub trait ConflictResolver {
    async fn resolve(&self, conflicts: &[SyncConflict]) -> Result<Vec<SyncResolution>>;
}

/// Answers every conflict the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedResolver(pub SyncResolution);

impl ConflictResolver for FixedResolver {
    async fn resolve(&self, conflicts: &[SyncConflict]) -> Result<Vec<SyncResolution>> {
        Ok(vec![self.0; conflicts.len()])
    }
}

impl<F> ConflictResolver for F
where
    F: Fn(&[SyncConflict]) -> Result<Vec<SyncResolution>>,
{
    async fn resolve(&self, conflicts: &[SyncConflict]) -> Result<Vec<SyncResolution>> {
        self(conflicts)
    }
}
