//! Run report written at the end of a batch.
//!
//! The report file (`files_info.json`) is the program's sole persisted
//! artifact: a summary plus one immutable record per caption, in input order.

use std::fmt;
use std::io;
use std::path::Path;

use serde::Serialize;

/// Outcome of processing a single caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Stored and verified with a positive size.
    Success,
    /// The store trigger succeeded but the size came back zero or unknown.
    UploadedButSizeUnknown,
    /// Some step errored; the record carries the message.
    Failed,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::UploadedButSizeUnknown => write!(f, "uploaded_but_size_unknown"),
            UploadStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Record of one caption's processing. Created once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRecord {
    /// Derived filename, e.g. `big_cat.jpg`.
    pub filename: String,
    /// The caption text as given.
    pub text: String,
    /// Stored size in bytes; 0 when unknown or failed.
    pub size: u64,
    /// Folder-prefixed destination path.
    pub path: String,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate counts for the run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub folder: String,
}

/// The full report: summary plus per-file records.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub files: Vec<UploadRecord>,
}

impl RunReport {
    /// Build a report from the per-caption records, deriving the counts.
    pub fn new(folder: &str, files: Vec<UploadRecord>) -> Self {
        let failed = files
            .iter()
            .filter(|f| f.status == UploadStatus::Failed)
            .count();
        RunReport {
            summary: RunSummary {
                total: files.len(),
                successful: files.len() - failed,
                failed,
                folder: folder.to_string(),
            },
            files,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    /// Write the report as pretty-printed UTF-8 JSON.
    pub async fn write_to(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await
    }
}
