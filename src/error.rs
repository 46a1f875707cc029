use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Per-transfer failure taxonomy. Batch scheduling converts these into
/// outcome entries; they never escape `run_batch`.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("HTTP status {status}")]
    Status { status: reqwest::StatusCode },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transfer timed out after {0:?}")]
    Timeout(Duration),
}
