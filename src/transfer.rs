use std::fs::{self, File};
use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::error::TransferError;
use crate::models::{DownloadTask, Transferred};
use crate::progress::{ProgressPatch, ProgressRegistry, TransferStatus};

/// Streams one remote resource to local storage, reporting byte-level
/// progress through the registry. No retries happen here; retry policy
/// belongs to the caller.
#[derive(Clone)]
pub struct TransferEngine {
    client: Client,
    registry: ProgressRegistry,
}

impl TransferEngine {
    pub fn new(registry: ProgressRegistry, proxy: Option<&str>) -> Result<Self> {
        let mut client_builder = Client::builder();

        if let Some(proxy_url) = proxy {
            client_builder = client_builder.proxy(reqwest::Proxy::http(proxy_url)?);
        }

        let client = client_builder
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, registry })
    }

    pub fn registry(&self) -> &ProgressRegistry {
        &self.registry
    }

    /// Transfer the task's source to its destination path.
    ///
    /// The destination directory is created idempotently. A non-success
    /// response fails before any file is created. On failure the partially
    /// written file is deleted so a fallback retry starts clean, and the
    /// registry entry is dropped either way.
    pub async fn transfer(&self, task: &DownloadTask) -> Result<Transferred, TransferError> {
        fs::create_dir_all(&task.dest_dir).map_err(|e| TransferError::Io {
            path: task.dest_dir.clone(),
            source: e,
        })?;

        self.registry.start(&task.candidate_id, &task.file_name);

        match self.stream_to_disk(task).await {
            Ok(done) => {
                self.registry.update(
                    &task.candidate_id,
                    ProgressPatch {
                        status: Some(TransferStatus::Completed),
                        ..Default::default()
                    },
                );
                self.registry.remove(&task.candidate_id);
                tracing::debug!("completed {} ({} bytes)", task.file_name, done.bytes);
                Ok(done)
            }
            Err(err) => {
                self.registry.update(
                    &task.candidate_id,
                    ProgressPatch {
                        status: Some(TransferStatus::Failed),
                        ..Default::default()
                    },
                );
                self.registry.remove(&task.candidate_id);
                let _ = fs::remove_file(task.dest_path());
                tracing::warn!("transfer failed for {}: {}", task.file_name, err);
                Err(err)
            }
        }
    }

    /// Race `transfer` against a deadline; a timeout reports failure and
    /// cleans up like any other mid-stream error.
    pub async fn transfer_with_deadline(
        &self,
        task: &DownloadTask,
        deadline: Duration,
    ) -> Result<Transferred, TransferError> {
        match tokio::time::timeout(deadline, self.transfer(task)).await {
            Ok(result) => result,
            Err(_) => {
                self.registry.remove(&task.candidate_id);
                let _ = fs::remove_file(task.dest_path());
                tracing::warn!("transfer timed out for {}", task.file_name);
                Err(TransferError::Timeout(deadline))
            }
        }
    }

    async fn stream_to_disk(&self, task: &DownloadTask) -> Result<Transferred, TransferError> {
        let mut request = self.client.get(&task.url);
        for (name, value) in &task.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut response = request.send().await?;

        if !response.status().is_success() {
            return Err(TransferError::Status {
                status: response.status(),
            });
        }

        // 0 means the response declared no length; percentage stays
        // indeterminate in that case.
        let total = response.content_length().unwrap_or(0);
        self.registry.update(
            &task.candidate_id,
            ProgressPatch {
                total: Some(total),
                status: Some(TransferStatus::Downloading),
                ..Default::default()
            },
        );

        let dest_path = task.dest_path();
        let mut file = File::create(&dest_path).map_err(|e| TransferError::Io {
            path: dest_path.clone(),
            source: e,
        })?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).map_err(|e| TransferError::Io {
                path: dest_path.clone(),
                source: e,
            })?;
            written += chunk.len() as u64;

            self.registry.update(
                &task.candidate_id,
                ProgressPatch {
                    bytes: Some(written),
                    ..Default::default()
                },
            );
        }

        file.flush().map_err(|e| TransferError::Io {
            path: dest_path.clone(),
            source: e,
        })?;

        Ok(Transferred {
            path: dest_path,
            bytes: written,
        })
    }
}
