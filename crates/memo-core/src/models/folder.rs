//! Folder model

use serde::{Deserialize, Serialize};

use super::FolderId;

/// A folder in the note tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Store-assigned identifier
    pub id: FolderId,
    /// Display name; the only cross-snapshot identity for folders
    pub name: String,
    /// Parent folder, `None` for root folders
    pub parent_id: Option<FolderId>,
    /// Whether notes inside may be edited
    pub is_read_only: bool,
    /// Optional display color
    pub color: Option<String>,
    /// Pin timestamp (Unix ms)
    pub pinned_at: Option<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Folder {
    /// Whether this folder sits at the top of the tree
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Values for inserting a new folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFolder {
    pub name: String,
    pub parent_id: Option<FolderId>,
    pub is_read_only: bool,
    pub color: Option<String>,
    pub pinned_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewFolder {
    /// A writable root folder stamped with the current time
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = crate::util::now_ms();
        Self {
            name: name.into(),
            parent_id: None,
            is_read_only: false,
            color: None,
            pinned_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Place the folder under `parent`
    #[must_use]
    pub const fn with_parent(mut self, parent: FolderId) -> Self {
        self.parent_id = Some(parent);
        self
    }
}
