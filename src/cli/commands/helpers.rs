//! Shared helpers: progress display and stage output persistence.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::pipeline::{ProgressEvent, Stage};

/// Drain the pipeline's event stream into an indicatif bar.
///
/// The bar length is set once pass two announces its candidate total;
/// per-document errors are printed above the bar without disturbing it.
pub fn spawn_progress_listener(mut receiver: UnboundedReceiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );

        while let Some(event) = receiver.recv().await {
            if let Some(total) = event.total_candidates {
                pb.set_length(total as u64);
            }
            match event.stage {
                Stage::PassOne | Stage::PassThree => {
                    pb.set_message(event.message);
                }
                Stage::PassTwo => {
                    if let Some(error) = &event.error {
                        pb.println(format!(
                            "{} {}: {}",
                            console::style("✗").red(),
                            event.current_document.as_deref().unwrap_or("?"),
                            error
                        ));
                    }
                    pb.set_position(event.scanned_count as u64);
                    let eta = event
                        .eta_seconds
                        .map(|s| format!(" (~{s}s left)"))
                        .unwrap_or_default();
                    pb.set_message(format!("{}{}", truncate(&event.message, 50), eta));
                }
            }
        }
        pb.finish_and_clear();
    })
}

/// Save a stage's output as pretty JSON.
pub fn save_stage_output<T: Serialize>(items: &[T], path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a prior stage's output, with a usage hint on a missing file.
pub fn load_stage_output<T: DeserializeOwned>(path: &Path, hint: &str) -> anyhow::Result<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {} ({})", path.display(), e, hint))?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
