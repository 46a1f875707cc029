use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::ValueEnum;

use crate::batch::BatchOutcome;
use crate::catalog::{classify, RepresentationType};
use crate::models::{Candidate, DownloadTask, LogicalAsset};
use crate::selection::{generate_filename, select_fallback};
use crate::source::MetadataSource;
use crate::transfer::TransferEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackMode {
    /// Substitute by priority order without asking.
    Auto,
    /// Ask the operator to pick a component per item.
    Manual,
    /// Leave failed items alone.
    Skip,
}

/// One item that failed its primary selection or transfer, with a freshly
/// fetched candidate list.
#[derive(Debug, Clone)]
pub struct FailedItem {
    pub asset: LogicalAsset,
    pub candidates: Vec<Candidate>,
    /// Representation types already tried, skipped during substitution.
    pub exclude: Vec<RepresentationType>,
    pub dest_dir: PathBuf,
    pub reason: String,
}

/// The interactive-UI boundary. Anything that can answer these two
/// questions can drive the manual path.
pub trait OperatorPrompt {
    fn choose_mode(&self, failed: &[FailedItem]) -> FallbackMode;
    /// Pick an index into `options`, or `None` to skip the item.
    fn choose_candidate(&self, item: &FailedItem, options: &[&Candidate]) -> Option<usize>;
}

/// Stdin-backed prompt for terminal use.
pub struct ConsolePrompt;

impl OperatorPrompt for ConsolePrompt {
    fn choose_mode(&self, failed: &[FailedItem]) -> FallbackMode {
        println!("\n{} item(s) failed:", failed.len());
        for item in failed {
            println!(
                "  {} {} v{:03}: {}",
                item.asset.parent_name, item.asset.name, item.asset.version, item.reason
            );
        }
        loop {
            print!("Recover with [a]utomatic substitution, [m]anual selection, or [s]kip? ");
            io::stdout().flush().ok();
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).is_err() {
                return FallbackMode::Skip;
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "a" | "auto" => return FallbackMode::Auto,
                "m" | "manual" => return FallbackMode::Manual,
                "s" | "skip" | "" => return FallbackMode::Skip,
                _ => continue,
            }
        }
    }

    fn choose_candidate(&self, item: &FailedItem, options: &[&Candidate]) -> Option<usize> {
        println!(
            "\nComponents for {} {} v{:03}:",
            item.asset.parent_name, item.asset.name, item.asset.version
        );
        for (idx, candidate) in options.iter().enumerate() {
            println!(
                "  [{}] {} ({}, {} bytes)",
                idx,
                candidate.name,
                candidate.file_type.as_deref().unwrap_or("?"),
                candidate.size
            );
        }
        print!("Pick a component number, or press enter to skip: ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return None;
        }
        line.trim().parse::<usize>().ok().filter(|i| *i < options.len())
    }
}

/// Re-selects and retries failed items one at a time. Never batched: this
/// path is small and operator oversight is expected. A fallback failure is
/// reported and the coordinator moves to the next item.
pub struct FallbackCoordinator<'a> {
    engine: &'a TransferEngine,
    source: &'a dyn MetadataSource,
}

impl<'a> FallbackCoordinator<'a> {
    pub fn new(engine: &'a TransferEngine, source: &'a dyn MetadataSource) -> Self {
        Self { engine, source }
    }

    pub async fn run(
        &self,
        items: Vec<FailedItem>,
        mode: FallbackMode,
        prompt: &dyn OperatorPrompt,
    ) -> Vec<BatchOutcome> {
        if mode == FallbackMode::Skip {
            return Vec::new();
        }

        let mut outcomes = Vec::with_capacity(items.len());
        for item in items {
            let selected = match mode {
                FallbackMode::Auto => select_fallback(&item.candidates, &item.exclude),
                FallbackMode::Manual => {
                    let options: Vec<&Candidate> = item.candidates.iter().collect();
                    if options.is_empty() {
                        None
                    } else {
                        prompt
                            .choose_candidate(&item, &options)
                            .map(|idx| options[idx])
                    }
                }
                FallbackMode::Skip => unreachable!(),
            };

            let Some(candidate) = selected else {
                tracing::warn!(
                    "no remaining component for {} {} v{:03}, skipping",
                    item.asset.parent_name,
                    item.asset.name,
                    item.asset.version
                );
                continue;
            };

            match self.retry_with(&item, candidate).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(reason) => {
                    tracing::warn!("fallback skipped for {}: {}", candidate.id, reason);
                }
            }
        }
        outcomes
    }

    /// Build a fresh task for the substitute candidate and transfer it.
    async fn retry_with(
        &self,
        item: &FailedItem,
        candidate: &Candidate,
    ) -> Result<BatchOutcome, String> {
        let locator = self
            .source
            .resolve_locator(&candidate.id)
            .map_err(|e| e.to_string())?;

        let rep = classify(candidate);
        let task = DownloadTask {
            candidate_id: candidate.id.clone(),
            url: locator.url,
            headers: locator.headers,
            dest_dir: item.dest_dir.clone(),
            file_name: generate_filename(&item.asset, rep, candidate.file_type.as_deref()),
        };

        let outcome = match self.engine.transfer(&task).await {
            Ok(done) => BatchOutcome::success(task, done),
            Err(err) => BatchOutcome::failure(task, err.to_string()),
        };
        Ok(outcome)
    }
}
