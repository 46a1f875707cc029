use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

/// Live record for one in-flight transfer. Transient: the owning engine
/// removes it once the transfer reaches a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct TransferProgress {
    pub task_id: String,
    pub file_name: String,
    pub bytes: u64,
    /// Total bytes, 0 when the source did not declare a length.
    pub total: u64,
    pub status: TransferStatus,
}

impl TransferProgress {
    /// Percentage complete, or `None` when the total is unknown
    /// (indeterminate progress).
    pub fn percent(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.bytes as f64 / self.total as f64 * 100.0)
        }
    }
}

/// Fields to merge into an existing progress record.
#[derive(Debug, Default)]
pub struct ProgressPatch {
    pub bytes: Option<u64>,
    pub total: Option<u64>,
    pub status: Option<TransferStatus>,
}

/// Table of in-flight transfers, keyed by task identity. Owned by one
/// orchestrator instance and shared with its workers; each task id is only
/// ever written by the single transfer that owns it.
#[derive(Debug, Clone, Default)]
pub struct ProgressRegistry {
    inner: Arc<Mutex<HashMap<String, TransferProgress>>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, task_id: &str, file_name: &str) {
        let mut table = self.inner.lock().unwrap();
        table.insert(
            task_id.to_string(),
            TransferProgress {
                task_id: task_id.to_string(),
                file_name: file_name.to_string(),
                bytes: 0,
                total: 0,
                status: TransferStatus::Pending,
            },
        );
    }

    /// Merge the patch into the record for `task_id`. A missing record is
    /// ignored rather than treated as an error.
    pub fn update(&self, task_id: &str, patch: ProgressPatch) {
        let mut table = self.inner.lock().unwrap();
        if let Some(entry) = table.get_mut(task_id) {
            if let Some(bytes) = patch.bytes {
                entry.bytes = bytes;
            }
            if let Some(total) = patch.total {
                entry.total = total;
            }
            if let Some(status) = patch.status {
                entry.status = status;
            }
        }
    }

    pub fn remove(&self, task_id: &str) {
        self.inner.lock().unwrap().remove(task_id);
    }

    pub fn snapshot(&self) -> Vec<TransferProgress> {
        self.inner.lock().unwrap().values().cloned().collect()
    }
}
