use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One downloadable representation of a version, as reported by the
/// metadata source. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    /// Declared extension, without the leading dot.
    pub file_type: Option<String>,
    /// Declared byte size; 0 when the source does not know it.
    pub size: u64,
    pub asset_id: String,
    /// Set when the metadata source flags this as the uploaded original.
    pub canonical: bool,
}

/// The versioned work item that owns one or more candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalAsset {
    pub id: String,
    pub parent_name: String,
    pub name: String,
    pub version: u32,
}

/// A single source-to-destination transfer request. Consumed exactly once;
/// a fallback retry builds a new task rather than reusing this one.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub candidate_id: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub dest_dir: PathBuf,
    pub file_name: String,
}

impl DownloadTask {
    pub fn dest_path(&self) -> PathBuf {
        self.dest_dir.join(&self.file_name)
    }
}

/// What a completed transfer leaves behind.
#[derive(Debug, Clone)]
pub struct Transferred {
    pub path: PathBuf,
    pub bytes: u64,
}
