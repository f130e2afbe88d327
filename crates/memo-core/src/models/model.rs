//! Model (LLM) reference model

use serde::{Deserialize, Serialize};

use super::ModelId;

/// A named model that logs can reference. Names are the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    /// Display rank
    pub order: i64,
    pub is_default: bool,
}

/// Values for inserting a new model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModel {
    pub name: String,
    /// `None` appends after the current highest rank
    pub order: Option<i64>,
    pub is_default: bool,
}

impl NewModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: None,
            is_default: false,
        }
    }
}
