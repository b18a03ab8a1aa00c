use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyzer::AnalysisResult;
use crate::session::SessionMode;

/// Maximum number of archived sessions kept; oldest entries are evicted
/// first, strictly by insertion order.
pub const HISTORY_CAP: usize = 20;

/// Summary of one completed session, archived with its full result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Current-time-derived token; adequate for a single-user local archive
    pub id: String,
    pub date: DateTime<Utc>,
    pub topic: String,
    pub mode: SessionMode,
    pub score: u8,
    pub wpm: u32,
    pub sentiment: String,
    pub full_result: AnalysisResult,
}

impl HistoryItem {
    /// Wrap a finished analysis for archiving.
    pub fn from_result(topic: &str, mode: SessionMode, result: AnalysisResult) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            date: now,
            topic: topic.to_string(),
            mode,
            score: result.overall_score,
            wpm: result.wpm,
            sentiment: result.sentiment.clone(),
            full_result: result,
        }
    }
}

/// JSON-file-backed archive of past sessions, most-recent-first.
///
/// Persistence failures never interrupt the main flow: reads degrade to an
/// empty list and writes to a logged no-op.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Archived sessions, most recent first. Absent or corrupt backing
    /// storage yields an empty list.
    pub fn list(&self) -> Vec<HistoryItem> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str::<Vec<HistoryItem>>(&contents) {
            Ok(items) => items,
            Err(e) => {
                warn!("History file not parsable, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Look up one archived session by id.
    pub fn find(&self, id: &str) -> Option<HistoryItem> {
        self.list().into_iter().find(|item| item.id == id)
    }

    /// Prepend an item, truncate to the cap, persist. Failures are logged
    /// and dropped.
    pub fn append(&self, item: HistoryItem) {
        let mut items = self.list();
        items.insert(0, item);
        items.truncate(HISTORY_CAP);

        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create history directory: {}", e);
                return;
            }
        }

        let contents = match serde_json::to_string_pretty(&items) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to encode history: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, contents) {
            warn!("Failed to write history: {}", e);
        }
    }
}
