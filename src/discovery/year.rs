//! Creation-year filtering of the candidate list.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::metadata::MetadataReader;
use crate::models::{CandidateDocument, Origin};

/// Metadata keys consulted, in order, for a local document's creation date.
const CREATION_KEYS: &[&str] = &["kMDItemContentCreationDate", "creation_date"];

/// Optional filter retaining only candidates created in the requested years.
#[derive(Debug, Clone, Default)]
pub struct YearFilter {
    years: BTreeSet<i32>,
}

impl YearFilter {
    pub fn new(years: impl IntoIterator<Item = i32>) -> Self {
        Self {
            years: years.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    /// Label used in report filenames: "2022_2023" or "all".
    pub fn label(&self) -> String {
        if self.years.is_empty() {
            "all".to_string()
        } else {
            self.years
                .iter()
                .map(|y| y.to_string())
                .collect::<Vec<_>>()
                .join("_")
        }
    }

    /// Apply the filter. With no years requested every candidate passes,
    /// including those whose year cannot be determined; with a filter in
    /// place an undetermined year excludes the candidate.
    pub fn apply(
        &self,
        candidates: Vec<CandidateDocument>,
        reader: &dyn MetadataReader,
    ) -> Vec<CandidateDocument> {
        if self.years.is_empty() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|candidate| match candidate_year(candidate, reader) {
                Some(year) => self.years.contains(&year),
                None => {
                    tracing::debug!(
                        "excluding '{}': creation year unknown",
                        candidate.display_name
                    );
                    false
                }
            })
            .collect()
    }
}

/// Best-effort creation year for one candidate.
pub fn candidate_year(candidate: &CandidateDocument, reader: &dyn MetadataReader) -> Option<i32> {
    match &candidate.origin {
        Origin::Local { path } => local_year(path, reader),
        Origin::Remote { .. } => candidate.modified.map(|dt| dt.year()),
    }
}

fn local_year(path: &Path, reader: &dyn MetadataReader) -> Option<i32> {
    let metadata = reader.read(path);
    for key in CREATION_KEYS {
        if let Some(year) = metadata.get(*key).and_then(|v| parse_year_loose(v)) {
            return Some(year);
        }
    }
    // Filesystem fallback: creation time where the platform exposes it,
    // otherwise last modification.
    let fs_meta = std::fs::metadata(path).ok()?;
    let time = fs_meta.created().or_else(|_| fs_meta.modified()).ok()?;
    Some(DateTime::<Utc>::from(time).year())
}

/// Pull a plausible year out of free-form date text.
///
/// Tries RFC 3339 and a few common layouts first, then falls back to the
/// first standalone 4-digit run in a sane range.
pub fn parse_year_loose(value: &str) -> Option<i32> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.year());
    }
    for format in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.year());
        }
    }
    let bytes = trimmed.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                let year: i32 = trimmed[start..i].parse().ok()?;
                if (1900..=2200).contains(&year) {
                    return Some(year);
                }
            }
        } else {
            i += 1;
        }
    }
    None
}
