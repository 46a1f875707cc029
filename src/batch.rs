use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use futures::future::join_all;
use tokio::task;

use crate::models::{DownloadTask, Transferred};
use crate::transfer::TransferEngine;

/// Per-task result collected by the scheduler. Always one entry per input
/// task, in input order.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub task: DownloadTask,
    pub success: bool,
    pub path: Option<PathBuf>,
    pub bytes: u64,
    pub reason: Option<String>,
}

impl BatchOutcome {
    pub fn success(task: DownloadTask, done: Transferred) -> Self {
        Self {
            task,
            success: true,
            path: Some(done.path),
            bytes: done.bytes,
            reason: None,
        }
    }

    pub fn failure(task: DownloadTask, reason: String) -> Self {
        Self {
            task,
            success: false,
            path: None,
            bytes: 0,
            reason: Some(reason),
        }
    }
}

#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Runs download tasks in fixed-size groups: groups are strictly
/// sequential, members of a group run concurrently. The group size is the
/// concurrency bound.
pub struct BatchScheduler {
    engine: TransferEngine,
    concurrency: usize,
    deadline: Option<Duration>,
}

impl BatchScheduler {
    pub fn new(engine: TransferEngine, concurrency: usize, deadline: Option<Duration>) -> Self {
        Self {
            engine,
            concurrency,
            deadline,
        }
    }

    /// Run every task to a settled outcome. Per-task failures are captured
    /// in the outcome list and never abort the batch; only programmer
    /// errors (zero concurrency, a task without a destination name) are
    /// returned as errors.
    pub async fn run_batch(&self, tasks: Vec<DownloadTask>) -> Result<BatchReport> {
        if self.concurrency == 0 {
            bail!("concurrency limit must be at least 1");
        }
        for task in &tasks {
            if task.file_name.is_empty() {
                bail!(
                    "download task for candidate {} has no destination filename",
                    task.candidate_id
                );
            }
        }

        let started = Instant::now();
        let attempted = tasks.len();
        let mut outcomes: Vec<BatchOutcome> = Vec::with_capacity(attempted);

        for group in tasks.chunks(self.concurrency) {
            let group_started = Instant::now();

            let mut handles = Vec::with_capacity(group.len());
            for task in group {
                let engine = self.engine.clone();
                let task = task.clone();
                let deadline = self.deadline;
                handles.push(task::spawn(async move {
                    match deadline {
                        Some(limit) => engine.transfer_with_deadline(&task, limit).await,
                        None => engine.transfer(&task).await,
                    }
                }));
            }

            // Wait for the whole group to settle; one failure never
            // cancels its siblings.
            let settled = join_all(handles).await;
            for (task, joined) in group.iter().cloned().zip(settled) {
                let outcome = match joined {
                    Ok(Ok(done)) => BatchOutcome::success(task, done),
                    Ok(Err(err)) => BatchOutcome::failure(task, err.to_string()),
                    Err(err) => {
                        BatchOutcome::failure(task, format!("unexpected error: {err}"))
                    }
                };
                outcomes.push(outcome);
            }

            let group_outcomes = &outcomes[outcomes.len() - group.len()..];
            let group_ok = group_outcomes.iter().filter(|o| o.success).count();
            tracing::info!(
                "group settled: {} ok, {} failed, {:.1}s",
                group_ok,
                group.len() - group_ok,
                group_started.elapsed().as_secs_f64()
            );
        }

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        let failed = attempted - succeeded;
        let elapsed = started.elapsed();
        tracing::info!(
            "batch settled: {} attempted, {} ok, {} failed, {:.1}s",
            attempted,
            succeeded,
            failed,
            elapsed.as_secs_f64()
        );

        Ok(BatchReport {
            outcomes,
            attempted,
            succeeded,
            failed,
            elapsed,
        })
    }
}
