//! Shared store service used by application code and the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::EngineConfig;
use crate::db::{
    CommentRepository, Database, FolderRepository, LogRepository, ModelRepository,
    SqliteCommentRepository, SqliteFolderRepository, SqliteLogRepository, SqliteModelRepository,
};
use crate::models::{
    Comment, Folder, Log, LogId, Model, NewComment, NewFolder, NewLog, NewModel, SyncConflict,
};
use crate::snapshot::{open_snapshot, Snapshot, SnapshotCipher};
use crate::sync::{
    analyze_sync_scope, export_snapshot, resolve_sync_scope, ConflictResolver, ExportFilter,
    MergeEngine, MergeOutcome, SyncScope,
};
use crate::Result;

/// Thread-safe handle to the local store and the merge engine.
#[derive(Clone)]
pub struct MemoService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
    engine: MergeEngine,
}

impl MemoService {
    /// Open a store at the given filesystem path, creating parent directories.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
            engine: MergeEngine::default(),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
            engine: MergeEngine::default(),
        })
    }

    /// Replace the engine configuration after validating it.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        self.engine = MergeEngine::new(config);
        Ok(self)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub const fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    /// Serialize the store, or a subset of its logs.
    pub async fn export_snapshot(&self, filter: &ExportFilter) -> Result<Snapshot> {
        let db = self.db.lock().await;
        export_snapshot(db.connection(), filter)
    }

    /// Conflicts a merge of `snapshot` would hand to a resolver.
    pub async fn preview_conflicts(&self, snapshot: &Snapshot) -> Result<Vec<SyncConflict>> {
        let db = self.db.lock().await;
        let plan = self.engine.plan(db.connection(), snapshot)?;
        Ok(plan.into_conflicts())
    }

    /// Merge with last-write-wins for every matched log.
    pub async fn merge_snapshot(&self, snapshot: &Snapshot) -> Result<MergeOutcome> {
        let mut db = self.db.lock().await;
        self.engine.merge_snapshot(&mut db, snapshot)
    }

    /// Merge, asking `resolver` about content conflicts first.
    ///
    /// The store lock is not held while the resolver runs, so it may read
    /// through this service. Callers must not run two merges at once.
    pub async fn merge_snapshot_with<R: ConflictResolver>(
        &self,
        snapshot: &Snapshot,
        resolver: &R,
    ) -> Result<MergeOutcome> {
        let plan = {
            let db = self.db.lock().await;
            self.engine.plan(db.connection(), snapshot)?
        };

        let plan = plan.resolve(resolver).await?;

        let mut db = self.db.lock().await;
        self.engine.apply(&mut db, snapshot, &plan)
    }

    /// Decode a snapshot file and merge it with last-write-wins.
    pub async fn import_payload(
        &self,
        payload: &str,
        cipher: Option<&dyn SnapshotCipher>,
        password: Option<&str>,
    ) -> Result<MergeOutcome> {
        let snapshot = open_snapshot(payload, cipher, password)?;
        self.merge_snapshot(&snapshot).await
    }

    /// Decode a snapshot file and merge it through `resolver`.
    pub async fn import_payload_with<R: ConflictResolver>(
        &self,
        payload: &str,
        cipher: Option<&dyn SnapshotCipher>,
        password: Option<&str>,
        resolver: &R,
    ) -> Result<MergeOutcome> {
        let snapshot = open_snapshot(payload, cipher, password)?;
        self.merge_snapshot_with(&snapshot, resolver).await
    }

    pub async fn analyze_sync_scope(&self, focus: Option<LogId>) -> Result<SyncScope> {
        let db = self.db.lock().await;
        analyze_sync_scope(db.connection(), focus)
    }

    pub async fn resolve_sync_scope(&self, focus: Option<LogId>) -> Result<Option<Vec<LogId>>> {
        let db = self.db.lock().await;
        resolve_sync_scope(db.connection(), focus)
    }

    /// List logs, most recently updated first.
    pub async fn list_logs(&self, limit: usize, offset: usize) -> Result<Vec<Log>> {
        let db = self.db.lock().await;
        SqliteLogRepository::new(db.connection()).list(limit, offset)
    }

    pub async fn get_log(&self, id: LogId) -> Result<Option<Log>> {
        let db = self.db.lock().await;
        SqliteLogRepository::new(db.connection()).get(id)
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        let db = self.db.lock().await;
        SqliteFolderRepository::new(db.connection()).list()
    }

    pub async fn list_models(&self) -> Result<Vec<Model>> {
        let db = self.db.lock().await;
        SqliteModelRepository::new(db.connection()).list()
    }

    /// Comments of one log, oldest first.
    pub async fn list_comments(&self, log_id: LogId) -> Result<Vec<Comment>> {
        let db = self.db.lock().await;
        SqliteCommentRepository::new(db.connection()).list_for_log(log_id)
    }

    pub async fn create_folder(&self, folder: &NewFolder) -> Result<Folder> {
        let db = self.db.lock().await;
        SqliteFolderRepository::new(db.connection()).create(folder)
    }

    pub async fn create_model(&self, model: &NewModel) -> Result<Model> {
        let db = self.db.lock().await;
        SqliteModelRepository::new(db.connection()).create(model)
    }

    /// Insert a log; logs without a folder land in the default folder.
    pub async fn create_log(&self, log: &NewLog) -> Result<Log> {
        let db = self.db.lock().await;
        let conn = db.connection();

        if log.folder_id.is_some() {
            return SqliteLogRepository::new(conn).create(log);
        }

        let mut log = log.clone();
        log.folder_id = SqliteFolderRepository::new(conn)
            .default_folder()?
            .map(|folder| folder.id);
        SqliteLogRepository::new(conn).create(&log)
    }

    pub async fn add_comment(&self, log_id: LogId, content: &str) -> Result<Comment> {
        let db = self.db.lock().await;
        SqliteCommentRepository::new(db.connection()).create(&NewComment::new(log_id, content))
    }
}
