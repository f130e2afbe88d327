//! Error types for memo-core

use thiserror::Error;

/// Result type alias using memo-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in memo-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot does not have the expected shape
    #[error("Invalid backup file format: {0}")]
    InvalidFormat(String),

    /// Snapshot is encrypted and no password was supplied
    #[error("PASSWORD_REQUIRED")]
    PasswordRequired,

    /// Snapshot could not be decrypted with the supplied password
    #[error("INVALID_PASSWORD")]
    InvalidPassword,

    /// Conflict resolution failed or returned an unusable answer
    #[error("Conflict resolution failed: {0}")]
    Resolution(String),

    /// Engine configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error was raised before the store was touched.
    ///
    /// Format, password, resolution and configuration problems are detected
    /// ahead of the write phase; everything else may come from a rolled-back
    /// transaction.
    pub const fn is_pre_apply(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::PasswordRequired
                | Self::InvalidPassword
                | Self::Resolution(_)
                | Self::Config(_)
        )
    }
}
