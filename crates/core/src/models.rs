use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fully materialised catalog row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub extension: String,
    pub size: u64,
    pub modified: String,
    pub content: String,
    pub summary: Option<String>,
    pub category: Option<String>,
}

/// Upsert input gathered by the indexer for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    pub name: String,
    pub path: String,
    pub extension: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileListing {
    pub id: i64,
    pub name: String,
    pub size: u64,
    pub category: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    pub summary: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingSummary {
    pub id: i64,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Follow symbolic links while walking. Link cycles are detected and skipped.
    pub follow_links: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryFailure {
    pub id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryReport {
    pub requested: usize,
    pub summarized: usize,
    pub classified: usize,
    pub failures: Vec<SummaryFailure>,
}

impl SummaryReport {
    pub fn nothing_pending(&self) -> bool {
        self.requested == 0
    }
}
