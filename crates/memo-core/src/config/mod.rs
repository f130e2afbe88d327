//! Reconciliation engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields the stock matching windows.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default Log identity window: incoming and local `createdAt` must be
/// strictly closer than this to be the same Log.
pub const DEFAULT_LOG_MATCH_WINDOW_MS: i64 = 5_000;

/// Default Comment dedup window.
pub const DEFAULT_COMMENT_DEDUP_WINDOW_MS: i64 = 1_000;

/// Default suffix for Logs duplicated by a "both" resolution.
pub const DEFAULT_DUPLICATE_TITLE_SUFFIX: &str = " (Synced)";

/// Tunables for snapshot reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    pub log_match_window_ms: i64,
    pub comment_dedup_window_ms: i64,
    pub duplicate_title_suffix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_match_window_ms: DEFAULT_LOG_MATCH_WINDOW_MS,
            comment_dedup_window_ms: DEFAULT_COMMENT_DEDUP_WINDOW_MS,
            duplicate_title_suffix: DEFAULT_DUPLICATE_TITLE_SUFFIX.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config from a raw JSON payload.
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid engine config JSON: {error}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let payload = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Self::from_json_str(&payload)
    }

    /// Reject values that would make matching meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.log_match_window_ms <= 0 {
            return Err(Error::Config(
                "log_match_window_ms must be positive".to_string(),
            ));
        }
        if self.comment_dedup_window_ms <= 0 {
            return Err(Error::Config(
                "comment_dedup_window_ms must be positive".to_string(),
            ));
        }
        if self.duplicate_title_suffix.trim().is_empty() {
            return Err(Error::Config(
                "duplicate_title_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
