//! Backup/restore reconciliation.
//!
//! Snapshots produced by [`export_snapshot`] on one store are merged into
//! another by [`MergeEngine`]. The two stores share no identifiers, so the
//! engine pairs entities through an [`EntityMatcher`], asks an optional
//! [`ConflictResolver`] about divergent logs, and then writes everything in
//! one transaction.

mod conflict;
mod export;
mod matcher;
mod merge;
mod remap;
mod resolution;
mod scope;


pub use conflict::{detect_conflicts, ConflictResolver, ConflictSet, FixedResolver};
pub use export::{export_snapshot, ExportFilter};
pub use matcher::{EntityMatcher, HeuristicMatcher};
pub use merge::{MergeEngine, MergeOutcome, MergePlan};
pub use remap::IdRemap;
pub use resolution::LogDecision;
pub use scope::{analyze_sync_scope, resolve_sync_scope, ScopeKind, SyncScope, FULL_SCOPE_LABEL};
