use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;

use crate::progress::ProgressRegistry;

/// Terminal progress bars driven by polling the registry snapshot, one bar
/// per in-flight transfer.
pub struct ProgressDisplay {
    handle: JoinHandle<()>,
    bars: MultiProgress,
}

impl ProgressDisplay {
    pub fn attach(registry: ProgressRegistry) -> Self {
        let bars = MultiProgress::new();
        let bars_clone = bars.clone();

        let handle = tokio::spawn(async move {
            let mut active: HashMap<String, ProgressBar> = HashMap::new();
            let mut ticker = tokio::time::interval(Duration::from_millis(200));

            loop {
                ticker.tick().await;
                let snapshot = registry.snapshot();

                for entry in &snapshot {
                    let bar = active.entry(entry.task_id.clone()).or_insert_with(|| {
                        let bar = bars_clone.add(ProgressBar::new(entry.total.max(1)));
                        bar.set_message(entry.file_name.clone());
                        bar
                    });

                    if entry.percent().is_some() {
                        bar.set_style(
                            ProgressStyle::default_bar()
                                .template("{msg:30} {bar:40} {bytes}/{total_bytes}")
                                .unwrap()
                                .progress_chars("=>-"),
                        );
                        bar.set_length(entry.total);
                    } else {
                        // No declared length: show bytes only.
                        bar.set_style(
                            ProgressStyle::default_bar()
                                .template("{msg:30} {bytes}")
                                .unwrap(),
                        );
                    }
                    bar.set_position(entry.bytes);
                }

                // Transfers gone from the registry are settled; drop their bars.
                let live: Vec<String> = snapshot.iter().map(|e| e.task_id.clone()).collect();
                active.retain(|task_id, bar| {
                    if live.contains(task_id) {
                        true
                    } else {
                        bar.finish_and_clear();
                        false
                    }
                });
            }
        });

        Self { handle, bars }
    }

    pub fn finish(self) {
        self.handle.abort();
        self.bars.clear().ok();
    }
}
