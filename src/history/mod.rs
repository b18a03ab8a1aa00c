//! Session history archive
//!
//! A capped, most-recent-first log of completed sessions backed by a single
//! JSON file. Degrades to a no-op when storage is absent or corrupt.

mod store;

pub use store::{HistoryItem, HistoryStore, HISTORY_CAP};
