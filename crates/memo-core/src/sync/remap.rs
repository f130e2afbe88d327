//! Snapshot id to local id translation tables.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Maps ids from one snapshot onto local ids of the same entity kind, and
/// remembers which local rows were created by the current merge.
#[derive(Debug, Clone)]
pub struct IdRemap<Id> {
    map: HashMap<i64, Id>,
    created: HashSet<Id>,
}

impl<Id> Default for IdRemap<Id> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            created: HashSet::new(),
        }
    }
}

impl<Id: Copy + Eq + Hash> IdRemap<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that snapshot id `old` is the existing local row `local`
    pub fn insert(&mut self, old: i64, local: Id) {
        self.map.insert(old, local);
    }

    /// Record that snapshot id `old` was inserted as `local` by this merge
    pub fn insert_created(&mut self, old: i64, local: Id) {
        self.map.insert(old, local);
        self.created.insert(local);
    }

    pub fn get(&self, old: i64) -> Option<Id> {
        self.map.get(&old).copied()
    }

    /// Translate an optional reference; unknown ids resolve to `None`
    pub fn resolve(&self, old: Option<i64>) -> Option<Id> {
        old.and_then(|old| self.get(old))
    }

    pub fn was_created(&self, local: Id) -> bool {
        self.created.contains(&local)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
