//! Snapshot Model: the versioned backup document.
//!
//! Ids inside a snapshot belong to the store that produced it and are not
//! stable across exports; they are only used to relate entities within the
//! same document. The merge engine translates them into local ids.

mod envelope;
pub mod timestamp;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use envelope::{
    open_snapshot, seal_snapshot, EncryptedSnapshot, SnapshotCipher, SnapshotEnvelope,
};

/// Highest snapshot version this build understands
pub const SNAPSHOT_VERSION: u32 = 1;

const fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// A point-in-time export of the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Export time as RFC 3339
    #[serde(default)]
    pub timestamp: String,
    pub logs: Vec<SnapshotLog>,
    pub models: Vec<SnapshotModel>,
    #[serde(default)]
    pub comments: Vec<SnapshotComment>,
    #[serde(default)]
    pub folders: Vec<SnapshotFolder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFolder {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<i64>,
    #[serde(with = "timestamp")]
    pub created_at: i64,
    #[serde(with = "timestamp")]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotModel {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotLog {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_order: Option<i64>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<i64>,
    #[serde(with = "timestamp")]
    pub created_at: i64,
    #[serde(with = "timestamp")]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotComment {
    pub id: i64,
    pub log_id: i64,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: i64,
    #[serde(with = "timestamp")]
    pub updated_at: i64,
}

impl Snapshot {
    /// Validate the document shape and decode it.
    ///
    /// `logs` and `models` must be arrays; anything else is a format error
    /// raised before any store access.
    pub fn from_value(mut value: serde_json::Value) -> Result<Self> {
        let Some(object) = value.as_object_mut() else {
            return Err(Error::InvalidFormat("snapshot must be a JSON object".into()));
        };

        for key in ["logs", "models"] {
            if !object.get(key).is_some_and(serde_json::Value::is_array) {
                return Err(Error::InvalidFormat(format!("missing '{key}' array")));
            }
        }

        // Optional collections: null reads as absent
        for key in ["comments", "folders"] {
            if object.get(key).is_some_and(serde_json::Value::is_null) {
                object.remove(key);
            } else if object.get(key).is_some_and(|entry| !entry.is_array()) {
                return Err(Error::InvalidFormat(format!("'{key}' must be an array")));
            }
        }

        let mut snapshot: Self = serde_json::from_value(value)
            .map_err(|error| Error::InvalidFormat(error.to_string()))?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(Error::InvalidFormat(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }

        if let Some(folder) = snapshot.folders.iter().find(|f| f.name.trim().is_empty()) {
            return Err(Error::InvalidFormat(format!(
                "folder {} has an empty name",
                folder.id
            )));
        }
        if let Some(model) = snapshot.models.iter().find(|m| m.name.is_empty()) {
            return Err(Error::InvalidFormat(format!(
                "model {} has an empty name",
                model.id
            )));
        }

        for log in &mut snapshot.logs {
            if log.thread_id.is_none() {
                log.thread_order = None;
            }
        }

        Ok(snapshot)
    }

    /// Parse and validate a plain (unencrypted) snapshot document
    pub fn from_json_str(payload: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|error| Error::InvalidFormat(format!("not valid JSON: {error}")))?;
        Self::from_value(value)
    }

    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether the snapshot carries no entities at all
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
            && self.models.is_empty()
            && self.comments.is_empty()
            && self.folders.is_empty()
    }
}

/// Build a default file name for a snapshot export.
#[must_use]
pub fn suggested_snapshot_file_name(partial: bool, date: chrono::NaiveDate) -> String {
    let kind = if partial { "partial" } else { "backup" };
    format!("memo-{kind}-{}.json", date.format("%Y-%m-%d"))
}
