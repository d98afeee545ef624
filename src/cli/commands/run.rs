//! Scan, analyze, and full-run commands.

use std::path::Path;

use console::style;

use super::helpers::{load_stage_output, save_stage_output, spawn_progress_listener};
use crate::config::{Config, Settings};
use crate::discovery::YearFilter;
use crate::metadata::NullTagStore;
use crate::models::CandidateDocument;
use crate::pipeline::{Pipeline, ProgressSink};

fn build_pipeline(
    settings: Settings,
    config: Config,
    sink: ProgressSink,
    years: Vec<i32>,
    no_tags: bool,
) -> Pipeline {
    let mut pipeline =
        Pipeline::new(config, settings, sink).with_year_filter(YearFilter::new(years));
    if no_tags {
        pipeline = pipeline.with_tag_store(Box::new(NullTagStore));
    }
    pipeline
}

/// Pass one: discover candidates and save them for a later analyze.
pub async fn cmd_scan(
    settings: Settings,
    config: Config,
    years: Vec<i32>,
    output: &Path,
) -> anyhow::Result<()> {
    let (sink, receiver) = ProgressSink::channel();
    let listener = spawn_progress_listener(receiver);

    let mut pipeline = build_pipeline(settings, config, sink, years, true);
    let result = pipeline.pass_one().await.map(|c| c.to_vec());
    drop(pipeline); // closes the sink so the listener drains and exits
    let _ = listener.await;

    let candidates = result?;
    save_stage_output(&candidates, output)?;
    println!(
        "{} Found {} candidate(s), saved to {}",
        style("✓").green(),
        candidates.len(),
        output.display()
    );
    Ok(())
}

/// Pass two: enrich saved candidates and save the records.
pub async fn cmd_analyze(
    settings: Settings,
    config: Config,
    input: &Path,
    output: &Path,
    no_tags: bool,
) -> anyhow::Result<()> {
    let candidates: Vec<CandidateDocument> =
        load_stage_output(input, "run `dossier scan` first")?;
    println!(
        "Analyzing {} candidate(s) from {}",
        candidates.len(),
        input.display()
    );

    let (sink, receiver) = ProgressSink::channel();
    let listener = spawn_progress_listener(receiver);

    let mut pipeline = build_pipeline(settings, config, sink, Vec::new(), no_tags);
    pipeline.seed_candidates(candidates);
    let result = pipeline.pass_two().await.map(|a| a.to_vec());
    drop(pipeline);
    let _ = listener.await;

    let artifacts = result?;
    save_stage_output(&artifacts, output)?;
    println!(
        "{} Analyzed {} document(s), saved to {}",
        style("✓").green(),
        artifacts.len(),
        output.display()
    );
    Ok(())
}

/// All three passes end to end.
pub async fn cmd_run(
    settings: Settings,
    config: Config,
    years: Vec<i32>,
    no_tags: bool,
) -> anyhow::Result<()> {
    let (sink, receiver) = ProgressSink::channel();
    let listener = spawn_progress_listener(receiver);

    let mut pipeline = build_pipeline(settings, config, sink, years, no_tags);
    let result = pipeline.run_all().await;
    drop(pipeline);
    let _ = listener.await;

    let summary = result?;
    println!(
        "{} {} candidate(s), {} processed",
        style("✓").green(),
        summary.candidate_count,
        summary.processed_count
    );
    println!("  Report: {}", summary.report_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Artifact;

    #[test]
    fn stage_files_round_trip_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        let candidates = vec![CandidateDocument::local(
            std::path::PathBuf::from("/docs/a.pdf"),
            10,
            None,
        )];
        save_stage_output(&candidates, &path).unwrap();
        let loaded: Vec<CandidateDocument> = load_stage_output(&path, "test").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].display_name, "a.pdf");
    }

    #[test]
    fn stage_files_round_trip_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.json");
        let artifacts = vec![Artifact::new(CandidateDocument::local(
            std::path::PathBuf::from("/docs/a.pdf"),
            10,
            None,
        ))];
        save_stage_output(&artifacts, &path).unwrap();
        let loaded: Vec<Artifact> = load_stage_output(&path, "test").unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].classification.is_none());
    }
}
