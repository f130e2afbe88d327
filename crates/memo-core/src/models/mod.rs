//! Data models for Memo

mod comment;
mod folder;
mod ids;
mod log;
mod model;
mod sync_conflict;

pub use comment::{Comment, NewComment};
pub use folder::{Folder, NewFolder};
pub use ids::{CommentId, FolderId, LogId, ModelId};
pub use log::{normalize_tags, Log, NewLog};
pub use model::{Model, NewModel};
pub use sync_conflict::{SyncConflict, SyncResolution};
