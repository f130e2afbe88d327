pub mod common;
pub mod export;
pub mod import;
pub mod list;
pub mod scope;
