//! Merge transaction coordinator.
//!
//! A merge runs in three phases:
//!
//! 1. [`MergeEngine::plan`] reads the local logs once and computes matches
//!    and conflicts against that pre-merge state.
//! 2. [`MergePlan::resolve`] awaits the external resolver. Nothing has been
//!    written yet, so a failing resolver leaves the store untouched.
//! 3. [`MergeEngine::apply`] writes folders, models, logs and comments in
//!    that order inside one transaction.

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;
use serde::Serialize;

use super::conflict::{detect_conflicts, ConflictResolver, ConflictSet};
use super::matcher::{EntityMatcher, HeuristicMatcher};
use super::remap::IdRemap;
use super::resolution::LogDecision;
use crate::config::EngineConfig;
use crate::db::{
    CommentRepository, Database, FolderRepository, LogRepository, ModelRepository,
    SqliteCommentRepository, SqliteFolderRepository, SqliteLogRepository, SqliteModelRepository,
};
use crate::error::{Error, Result};
use crate::models::{
    normalize_tags, Folder, FolderId, Log, LogId, ModelId, NewComment, NewFolder, NewLog,
    NewModel, SyncConflict, SyncResolution,
};
use crate::snapshot::{Snapshot, SnapshotLog, SNAPSHOT_VERSION};
use crate::util::normalize_text_option;

/// What a merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Local logs created or updated by the merge, first touch first
    pub mirror_ids: Vec<LogId>,
    pub folders_created: usize,
    pub folders_updated: usize,
    pub models_created: usize,
    pub logs_created: usize,
    pub logs_updated: usize,
    pub comments_added: usize,
    pub comments_skipped: usize,
}

impl MergeOutcome {
    fn touch(&mut self, seen: &mut HashSet<LogId>, id: LogId) {
        if seen.insert(id) {
            self.mirror_ids.push(id);
        }
    }

    /// Whether the merge left the store as it was
    pub fn is_noop(&self) -> bool {
        self.mirror_ids.is_empty()
            && self.folders_created == 0
            && self.folders_updated == 0
            && self.models_created == 0
            && self.comments_added == 0
    }
}

/// Matches and conflicts computed before any write
#[derive(Debug, Clone)]
pub struct MergePlan {
    log_matches: Vec<Option<LogId>>,
    conflicts: ConflictSet,
    resolutions: Option<Vec<SyncResolution>>,
}

impl MergePlan {
    pub fn conflicts(&self) -> &[SyncConflict] {
        self.conflicts.conflicts()
    }

    /// Take the conflict list, dropping matches and answers
    pub fn into_conflicts(self) -> Vec<SyncConflict> {
        self.conflicts.into_conflicts()
    }

    /// Number of incoming logs paired with an existing local log
    pub fn matched_logs(&self) -> usize {
        self.log_matches.iter().flatten().count()
    }

    /// Whether a resolver has answered for this plan
    pub const fn is_resolved(&self) -> bool {
        self.resolutions.is_some()
    }

    /// Ask `resolver` about every conflict and attach its answers.
    ///
    /// The resolver is only called when there is something to resolve. An
    /// answer list of the wrong length fails the merge here, before any
    /// write.
    pub async fn resolve<R: ConflictResolver>(mut self, resolver: &R) -> Result<Self> {
        if self.conflicts.is_empty() {
            self.resolutions = Some(Vec::new());
            return Ok(self);
        }

        tracing::info!("Awaiting resolution of {} conflicts", self.conflicts.len());
        let answers = resolver
            .resolve(self.conflicts.conflicts())
            .await
            .map_err(|error| match error {
                Error::Resolution(_) => error,
                other => Error::Resolution(other.to_string()),
            })?;

        if answers.len() != self.conflicts.len() {
            return Err(Error::Resolution(format!(
                "resolver returned {} answers for {} conflicts",
                answers.len(),
                self.conflicts.len()
            )));
        }

        self.resolutions = Some(answers);
        Ok(self)
    }

    /// The caller's answer for the incoming log at `index`, if it was in conflict
    fn resolution_for(&self, index: usize) -> Option<SyncResolution> {
        let answers = self.resolutions.as_ref()?;
        let position = self.conflicts.position_of(index)?;
        answers.get(position).copied()
    }
}

/// Reconciles snapshots into the local store.
#[derive(Debug, Clone)]
pub struct MergeEngine<M = HeuristicMatcher> {
    matcher: M,
    config: EngineConfig,
}

impl MergeEngine<HeuristicMatcher> {
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            matcher: HeuristicMatcher::from_config(&config),
            config,
        }
    }
}

impl Default for MergeEngine<HeuristicMatcher> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<M: EntityMatcher> MergeEngine<M> {
    /// Use a custom identity strategy
    pub const fn with_matcher(matcher: M, config: EngineConfig) -> Self {
        Self { matcher, config }
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read local logs and compute matches and conflicts
    pub fn plan(&self, conn: &Connection, snapshot: &Snapshot) -> Result<MergePlan> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(Error::InvalidFormat(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let local_logs = SqliteLogRepository::new(conn).list_all()?;
        let log_matches = snapshot
            .logs
            .iter()
            .map(|incoming| {
                self.matcher
                    .match_log(incoming, &local_logs)
                    .map(|local| local.id)
            })
            .collect::<Vec<_>>();
        let conflicts = detect_conflicts(&self.matcher, &snapshot.logs, &local_logs);

        tracing::debug!(
            "Planned merge: {} of {} incoming logs matched, {} conflicts",
            log_matches.iter().flatten().count(),
            snapshot.logs.len(),
            conflicts.len()
        );

        Ok(MergePlan {
            log_matches,
            conflicts,
            resolutions: None,
        })
    }

    /// Write the snapshot into the store in a single transaction
    pub fn apply(
        &self,
        db: &mut Database,
        snapshot: &Snapshot,
        plan: &MergePlan,
    ) -> Result<MergeOutcome> {
        if plan.log_matches.len() != snapshot.logs.len() {
            return Err(Error::InvalidInput(
                "merge plan was built for a different snapshot".to_string(),
            ));
        }

        tracing::info!(
            "Merging snapshot: {} folders, {} models, {} logs, {} comments",
            snapshot.folders.len(),
            snapshot.models.len(),
            snapshot.logs.len(),
            snapshot.comments.len()
        );

        let tx = db.transaction()?;
        let outcome = Apply::new(&self.matcher, &self.config, &tx).run(snapshot, plan)?;
        tx.commit()?;

        tracing::info!(
            "Merge committed: {} logs created, {} updated, {} comments added",
            outcome.logs_created,
            outcome.logs_updated,
            outcome.comments_added
        );
        Ok(outcome)
    }

    /// Merge without a resolver; matched logs use last-write-wins
    pub fn merge_snapshot(&self, db: &mut Database, snapshot: &Snapshot) -> Result<MergeOutcome> {
        let plan = self.plan(db.connection(), snapshot)?;
        self.apply(db, snapshot, &plan)
    }

    /// Merge, letting `resolver` settle content conflicts first
    pub async fn merge_snapshot_with<R: ConflictResolver>(
        &self,
        db: &mut Database,
        snapshot: &Snapshot,
        resolver: &R,
    ) -> Result<MergeOutcome> {
        let plan = self.plan(db.connection(), snapshot)?.resolve(resolver).await?;
        self.apply(db, snapshot, &plan)
    }
}

/// State of one apply phase
struct Apply<'a, M> {
    matcher: &'a M,
    config: &'a EngineConfig,
    conn: &'a Connection,
    folders: IdRemap<FolderId>,
    models: IdRemap<ModelId>,
    logs: IdRemap<LogId>,
    outcome: MergeOutcome,
    touched: HashSet<LogId>,
}

impl<'a, M: EntityMatcher> Apply<'a, M> {
    fn new(matcher: &'a M, config: &'a EngineConfig, conn: &'a Connection) -> Self {
        Self {
            matcher,
            config,
            conn,
            folders: IdRemap::new(),
            models: IdRemap::new(),
            logs: IdRemap::new(),
            outcome: MergeOutcome::default(),
            touched: HashSet::new(),
        }
    }

    fn run(mut self, snapshot: &Snapshot, plan: &MergePlan) -> Result<MergeOutcome> {
        self.merge_folders(snapshot)?;
        self.merge_models(snapshot)?;
        self.merge_logs(snapshot, plan)?;
        self.merge_comments(snapshot)?;
        Ok(self.outcome)
    }

    fn merge_folders(&mut self, snapshot: &Snapshot) -> Result<()> {
        let repo = SqliteFolderRepository::new(self.conn);
        let mut local = repo.list()?;
        let mut updated = HashSet::new();
        let mut prior_updated_at = HashMap::new();

        // Pass 1: match or create, ignoring parents
        for incoming in &snapshot.folders {
            if let Some(existing) = self.matcher.match_folder(incoming, &local) {
                let existing_id = existing.id;
                self.folders.insert(incoming.id, existing_id);
                prior_updated_at
                    .entry(existing_id)
                    .or_insert(existing.updated_at);

                if incoming.updated_at > existing.updated_at {
                    let mut folder = existing.clone();
                    folder.updated_at = incoming.updated_at;
                    if let Some(color) = normalize_text_option(incoming.color.clone()) {
                        folder.color = Some(color);
                    }
                    if incoming.pinned_at.is_some() {
                        folder.pinned_at = incoming.pinned_at;
                    }
                    repo.update(&folder)?;
                    replace_folder(&mut local, folder);
                    updated.insert(existing_id);
                }
                continue;
            }

            let created = repo.create(&NewFolder {
                name: incoming.name.clone(),
                parent_id: None,
                is_read_only: incoming.is_read_only,
                color: normalize_text_option(incoming.color.clone()),
                pinned_at: incoming.pinned_at,
                created_at: incoming.created_at,
                updated_at: incoming.updated_at,
            })?;
            tracing::debug!("Created folder '{}' as {}", created.name, created.id);
            self.folders.insert_created(incoming.id, created.id);
            self.outcome.folders_created += 1;
            local.push(created);
        }

        // Pass 2: restore parent edges once every folder has a local id
        let default_id = repo.default_folder()?.map(|folder| folder.id);
        for incoming in &snapshot.folders {
            let Some(parent_old) = incoming.parent_id else {
                continue;
            };
            let Some(folder_id) = self.folders.get(incoming.id) else {
                continue;
            };
            let Some(parent_id) = self.folders.get(parent_old) else {
                tracing::warn!(
                    "Folder '{}' references unknown parent {parent_old}, leaving it in place",
                    incoming.name
                );
                continue;
            };

            let created = self.folders.was_created(folder_id);
            let newer = prior_updated_at
                .get(&folder_id)
                .is_some_and(|prior| incoming.updated_at > *prior);
            if !created && !newer {
                continue;
            }
            if Some(folder_id) == default_id {
                continue;
            }

            let Some(mut folder) = repo.get(folder_id)? else {
                continue;
            };
            if folder.parent_id == Some(parent_id) {
                continue;
            }
            if repo.is_self_or_ancestor(folder_id, parent_id)? {
                tracing::warn!(
                    "Skipping parent of folder '{}': it would create a cycle",
                    folder.name
                );
                continue;
            }

            folder.parent_id = Some(parent_id);
            repo.update(&folder)?;
            if !created {
                updated.insert(folder_id);
            }
        }

        self.outcome.folders_updated = updated.len();
        Ok(())
    }

    fn merge_models(&mut self, snapshot: &Snapshot) -> Result<()> {
        let repo = SqliteModelRepository::new(self.conn);
        let mut local = repo.list()?;
        let mut has_default = repo.has_default()?;

        for incoming in &snapshot.models {
            if let Some(existing) = self.matcher.match_model(incoming, &local) {
                self.models.insert(incoming.id, existing.id);
                continue;
            }

            let is_default = incoming.is_default && !has_default;
            let created = repo.create(&NewModel {
                name: incoming.name.clone(),
                order: incoming.order,
                is_default,
            })?;
            has_default |= is_default;
            self.models.insert_created(incoming.id, created.id);
            self.outcome.models_created += 1;
            local.push(created);
        }

        Ok(())
    }

    fn merge_logs(&mut self, snapshot: &Snapshot, plan: &MergePlan) -> Result<()> {
        let repo = SqliteLogRepository::new(self.conn);
        let default_folder = SqliteFolderRepository::new(self.conn)
            .default_folder()?
            .ok_or_else(|| Error::Database("default folder is missing".to_string()))?
            .id;
        // Logs inserted by this merge, so repeated entries in one snapshot collapse
        let mut inserted: Vec<Log> = Vec::new();

        for (index, incoming) in snapshot.logs.iter().enumerate() {
            let planned = match plan.log_matches[index] {
                Some(id) => repo.get(id)?,
                None => None,
            };
            let resolution = planned
                .as_ref()
                .and_then(|_| plan.resolution_for(index));
            let local = match planned {
                Some(log) => Some(log),
                None => match self.matcher.match_log(incoming, &inserted) {
                    Some(earlier) => repo.get(earlier.id)?,
                    None => None,
                },
            };

            let decision = LogDecision::decide(local.is_some(), resolution);
            match (decision, local) {
                (LogDecision::Duplicate, Some(local)) => {
                    let mut draft = self.draft_log(incoming, default_folder);
                    draft.title =
                        format!("{}{}", incoming.title, self.config.duplicate_title_suffix);
                    draft.thread_id = None;
                    draft.thread_order = None;
                    let created = repo.create(&draft)?;
                    tracing::debug!(
                        "Kept local log {} and duplicated incoming as {}",
                        local.id,
                        created.id
                    );
                    self.logs.insert_created(incoming.id, created.id);
                    self.outcome.logs_created += 1;
                    self.outcome.touch(&mut self.touched, created.id);
                }
                (decision, Some(local)) => {
                    let local_id = local.id;
                    self.logs.insert(incoming.id, local_id);
                    if decision.overwrites(local.updated_at, incoming.updated_at) {
                        let updated = repo.update(&self.overwrite(local, incoming))?;
                        replace_log(&mut inserted, &updated);
                        self.outcome.logs_updated += 1;
                        self.outcome.touch(&mut self.touched, local_id);
                    }
                }
                (_, None) => {
                    let created = repo.create(&self.draft_log(incoming, default_folder))?;
                    self.logs.insert_created(incoming.id, created.id);
                    self.outcome.logs_created += 1;
                    self.outcome.touch(&mut self.touched, created.id);
                    inserted.push(created);
                }
            }
        }

        Ok(())
    }

    fn merge_comments(&mut self, snapshot: &Snapshot) -> Result<()> {
        let repo = SqliteCommentRepository::new(self.conn);

        for incoming in &snapshot.comments {
            let Some(log_id) = self.logs.get(incoming.log_id) else {
                tracing::warn!(
                    "Skipping comment {}: log {} is not part of this merge",
                    incoming.id,
                    incoming.log_id
                );
                self.outcome.comments_skipped += 1;
                continue;
            };

            let existing = repo.list_for_log(log_id)?;
            if self.matcher.is_duplicate_comment(incoming, log_id, &existing) {
                self.outcome.comments_skipped += 1;
                continue;
            }

            repo.create(&NewComment {
                log_id,
                content: incoming.content.clone(),
                created_at: incoming.created_at,
                updated_at: incoming.updated_at,
            })?;
            self.outcome.comments_added += 1;
        }

        Ok(())
    }

    /// New local log for an incoming one, references remapped
    fn draft_log(&self, incoming: &SnapshotLog, default_folder: FolderId) -> NewLog {
        NewLog {
            title: incoming.title.clone(),
            content: incoming.content.clone(),
            tags: normalize_tags(&incoming.tags),
            model_id: self.models.resolve(incoming.model_id),
            folder_id: Some(
                self.folders
                    .resolve(incoming.folder_id)
                    .unwrap_or(default_folder),
            ),
            thread_id: incoming.thread_id.clone(),
            thread_order: incoming.thread_id.as_ref().and(incoming.thread_order),
            pinned_at: incoming.pinned_at,
            created_at: incoming.created_at,
            updated_at: incoming.updated_at,
        }
    }

    /// Local log with the incoming mutable fields applied
    fn overwrite(&self, mut local: Log, incoming: &SnapshotLog) -> Log {
        local.title.clone_from(&incoming.title);
        local.content.clone_from(&incoming.content);
        local.tags = normalize_tags(&incoming.tags);
        local.updated_at = incoming.updated_at;

        if let Some(folder_id) = self.folders.resolve(incoming.folder_id) {
            local.folder_id = Some(folder_id);
        }
        if let Some(model_id) = self.models.resolve(incoming.model_id) {
            local.model_id = Some(model_id);
        }
        if incoming.pinned_at.is_some() {
            local.pinned_at = incoming.pinned_at;
        }
        if let Some(thread_id) = &incoming.thread_id {
            if local.thread_id.as_ref() != Some(thread_id) {
                local.thread_id = Some(thread_id.clone());
                local.thread_order = incoming.thread_order;
            }
        }

        local
    }
}

fn replace_folder(folders: &mut [Folder], folder: Folder) {
    if let Some(slot) = folders.iter_mut().find(|slot| slot.id == folder.id) {
        *slot = folder;
    }
}

fn replace_log(logs: &mut [Log], log: &Log) {
    if let Some(slot) = logs.iter_mut().find(|slot| slot.id == log.id) {
        slot.clone_from(log);
    }
}
