//! Database layer for Memo

mod comment_repository;
mod connection;
mod folder_repository;
mod log_repository;
mod migrations;
mod model_repository;

pub use comment_repository::{CommentRepository, SqliteCommentRepository};
pub use connection::Database;
pub use folder_repository::{FolderRepository, SqliteFolderRepository};
pub use log_repository::{LogRepository, SqliteLogRepository};
pub use migrations::DEFAULT_FOLDER_NAME;
pub use model_repository::{ModelRepository, SqliteModelRepository};
