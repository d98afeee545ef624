//! Report command.

use std::path::Path;

use console::style;

use super::helpers::load_stage_output;
use crate::config::{Config, Settings};
use crate::models::Artifact;
use crate::pipeline::{Pipeline, ProgressSink};

/// Pass three: write the CSV report from saved analysis records.
pub async fn cmd_report(
    settings: Settings,
    config: Config,
    input: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let artifacts: Vec<Artifact> = load_stage_output(input, "run `dossier analyze` first")?;

    let path = match output {
        Some(path) => {
            crate::report::write_report(&artifacts, path)?;
            path.to_path_buf()
        }
        None => {
            let mut pipeline = Pipeline::new(config, settings, ProgressSink::disabled());
            pipeline.seed_artifacts(artifacts.clone());
            pipeline.pass_three()?
        }
    };

    println!(
        "{} Report with {} row(s): {}",
        style("✓").green(),
        artifacts.len(),
        path.display()
    );
    Ok(())
}
