//! CSV report emission: pass three of the pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classifier::UNCLASSIFIED;
use crate::models::Artifact;

/// Base report filename; parameterized by year label when a reporting
/// directory is configured.
const REPORT_BASENAME: &str = "dossier_report";

const HEADERS: [&str; 7] = [
    "path",
    "category",
    "subcategory",
    "destination",
    "score",
    "rationale",
    "hours_spent",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Resolve the output path. With no configured reporting directory the
/// report lands in the current working directory under a fixed name;
/// otherwise the filename carries the year label ("2022_2023" or "all").
pub fn report_path(report_dir: Option<&Path>, year_label: &str) -> PathBuf {
    match report_dir {
        Some(dir) => dir.join(format!("{}_{}.csv", REPORT_BASENAME, year_label)),
        None => PathBuf::from(format!("{}.csv", REPORT_BASENAME)),
    }
}

/// Write one row per artifact, unclassified and failed ones included.
pub fn write_report(artifacts: &[Artifact], path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| ReportError::Create {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for artifact in artifacts {
        writer.write_record(row(artifact))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    tracing::info!("report written: {} ({} rows)", path.display(), artifacts.len());
    Ok(())
}

fn row(artifact: &Artifact) -> [String; 7] {
    let identifier = artifact.candidate.origin.identifier();
    match &artifact.classification {
        Some(c) => [
            identifier,
            c.primary.clone(),
            c.breakdown(),
            c.destination.clone(),
            format!("{:.1}", c.score),
            c.rationale.clone(),
            artifact
                .hours_spent
                .map(|h| format!("{h}"))
                .unwrap_or_default(),
        ],
        None => [
            identifier,
            UNCLASSIFIED.to_string(),
            String::new(),
            UNCLASSIFIED.to_string(),
            "0.0".to_string(),
            String::new(),
            String::new(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use crate::models::CandidateDocument;

    fn local_artifact(name: &str) -> Artifact {
        let candidate =
            CandidateDocument::local(PathBuf::from(format!("/docs/{name}")), 100, None);
        Artifact::new(candidate)
    }

    #[test]
    fn path_defaults_to_cwd_without_reporting_dir() {
        assert_eq!(report_path(None, "all"), PathBuf::from("dossier_report.csv"));
        assert_eq!(
            report_path(Some(Path::new("/reports")), "2022"),
            PathBuf::from("/reports/dossier_report_2022.csv")
        );
        assert_eq!(
            report_path(Some(Path::new("/reports")), "all"),
            PathBuf::from("/reports/dossier_report_all.csv")
        );
    }

    #[test]
    fn every_artifact_gets_a_row() {
        let mut classified = local_artifact("syllabus.pdf");
        let mut classification = Classification::unclassified();
        classification.primary = "Teaching".to_string();
        classification.destination = "Teaching Evidence".to_string();
        classification.score = 3.0;
        classified.classification = Some(classification);
        classified.hours_spent = Some(4.5);

        let unclassified = local_artifact("grocery_list.txt");
        let mut failed = local_artifact("corrupt.pdf");
        failed.failed = true;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dossier_report.csv");
        write_report(&[classified, unclassified, failed], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("path,category"));
        assert!(lines[1].contains("Teaching"));
        assert!(lines[1].contains("4.5"));
        // Unknown effort stays blank, never a literal "None".
        assert!(!contents.contains("None"));
        assert!(lines[2].contains(UNCLASSIFIED));
        assert!(lines[3].contains(UNCLASSIFIED));
    }

    #[test]
    fn unmatched_and_failed_rows_share_the_unclassified_destination() {
        let mut unmatched = local_artifact("notes.txt");
        unmatched.classification = Some(Classification::unclassified());
        let mut failed = local_artifact("corrupt.pdf");
        failed.failed = true;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dossier_report.csv");
        write_report(&[unmatched, failed], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        for line in contents.lines().skip(1) {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields[1], UNCLASSIFIED);
            assert_eq!(fields[3], UNCLASSIFIED);
        }
    }
}
