//! memo-core - Core library for Memo
//!
//! This crate contains the models, the local store, and the backup/restore
//! reconciliation engine that merges exported snapshots from other devices
//! into the current store.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod snapshot;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{LogId, SyncConflict, SyncResolution};
pub use services::MemoService;
