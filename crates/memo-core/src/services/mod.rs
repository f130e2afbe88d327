//! Async service facade over the store.

mod database;

pub use database::MemoService;
