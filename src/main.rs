mod batch;
mod catalog;
mod cli;
mod display;
mod error;
mod fallback;
mod models;
mod progress;
mod selection;
mod source;
#[cfg(test)]
mod test_support;
mod transfer;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::batch::BatchScheduler;
use crate::catalog::{classify, RepresentationType};
use crate::cli::Args;
use crate::display::ProgressDisplay;
use crate::fallback::{ConsolePrompt, FailedItem, FallbackCoordinator, OperatorPrompt};
use crate::models::{DownloadTask, LogicalAsset};
use crate::progress::ProgressRegistry;
use crate::selection::{generate_filename, select_primary, Preference};
use crate::source::{ManifestSource, MetadataSource};
use crate::transfer::TransferEngine;

/// A primary-pass task together with the selection context needed to build
/// a fallback item if it fails.
struct Planned {
    asset: LogicalAsset,
    rep: RepresentationType,
    task: DownloadTask,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let source = ManifestSource::load(&args.manifest)?;
    let output_dir = PathBuf::from(&args.output);

    let registry = ProgressRegistry::new();
    let engine = TransferEngine::new(registry.clone(), args.proxy.as_deref())?;

    let (planned, unmatched) = plan_downloads(&source, args.prefer, &output_dir)?;
    println!(
        "Queued {} of {} versions from {}",
        planned.len(),
        planned.len() + unmatched.len(),
        args.manifest
    );

    let deadline = args.timeout.map(Duration::from_secs);
    let scheduler = BatchScheduler::new(engine.clone(), args.concurrency, deadline);

    let display = ProgressDisplay::attach(engine.registry().clone());
    let tasks: Vec<DownloadTask> = planned.iter().map(|p| p.task.clone()).collect();
    let report = scheduler.run_batch(tasks).await?;
    display.finish();

    let transferred: u64 = report.outcomes.iter().map(|o| o.bytes).sum();
    println!(
        "\nDone: {} success, {} failed, {} bytes in {:.1}s",
        report.succeeded,
        report.failed,
        transferred,
        report.elapsed.as_secs_f64()
    );
    for outcome in report.outcomes.iter().filter(|o| !o.success) {
        tracing::warn!(
            "failed: {}: {}",
            outcome.task.file_name,
            outcome.reason.as_deref().unwrap_or("transfer failed")
        );
    }

    let mut failed_items = Vec::new();
    for (plan, outcome) in planned.iter().zip(&report.outcomes) {
        if outcome.success {
            continue;
        }
        failed_items.push(FailedItem {
            asset: plan.asset.clone(),
            // Fetched fresh: the failure may mean the previously selected
            // component is gone.
            candidates: source.fetch_candidates(&plan.asset.id)?,
            exclude: vec![plan.rep],
            dest_dir: output_dir.clone(),
            reason: outcome
                .reason
                .clone()
                .unwrap_or_else(|| "transfer failed".to_string()),
        });
    }
    for asset in unmatched {
        failed_items.push(FailedItem {
            candidates: source.fetch_candidates(&asset.id)?,
            asset,
            exclude: Vec::new(),
            dest_dir: output_dir.clone(),
            reason: "no suitable component".to_string(),
        });
    }

    if failed_items.is_empty() {
        return Ok(());
    }

    let prompt = ConsolePrompt;
    let mode = args
        .fallback
        .unwrap_or_else(|| prompt.choose_mode(&failed_items));

    let coordinator = FallbackCoordinator::new(&engine, &source);
    let recovered = coordinator.run(failed_items, mode, &prompt).await;

    if !recovered.is_empty() {
        let ok = recovered.iter().filter(|o| o.success).count();
        println!(
            "Fallback: {} recovered, {} failed",
            ok,
            recovered.len() - ok
        );
        for outcome in recovered.iter().filter(|o| o.success) {
            if let Some(path) = &outcome.path {
                tracing::info!("recovered {}", path.display());
            }
        }
    }

    Ok(())
}

/// Select one candidate per version and turn it into a download task.
/// Versions with no suitable component are returned separately so the
/// fallback phase can offer substitutes.
fn plan_downloads(
    source: &dyn MetadataSource,
    preference: Preference,
    output_dir: &PathBuf,
) -> Result<(Vec<Planned>, Vec<LogicalAsset>)> {
    let mut planned = Vec::new();
    let mut unmatched = Vec::new();

    for asset in source.assets() {
        let candidates = source.fetch_candidates(&asset.id)?;
        match select_primary(&candidates, preference) {
            Some(candidate) => {
                let rep = classify(candidate);
                let locator = source.resolve_locator(&candidate.id)?;
                let task = DownloadTask {
                    candidate_id: candidate.id.clone(),
                    url: locator.url,
                    headers: locator.headers,
                    dest_dir: output_dir.clone(),
                    file_name: generate_filename(&asset, rep, candidate.file_type.as_deref()),
                };
                planned.push(Planned { asset, rep, task });
            }
            None => {
                tracing::warn!(
                    "no suitable component for {} {} v{:03}",
                    asset.parent_name,
                    asset.name,
                    asset.version
                );
                unmatched.push(asset);
            }
        }
    }

    Ok((planned, unmatched))
}
