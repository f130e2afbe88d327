use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] memo_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Snapshot is encrypted and this build has no cipher to open it")]
    EncryptedSnapshot,
    #[error("Log not found: {0}")]
    LogNotFound(i64),
}
