//! Document records (artifacts) enriched by the analysis pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classifier::{Classification, UNCLASSIFIED};
use crate::models::CandidateDocument;

/// A candidate enriched with extracted text, metadata, classification and
/// derived fields.
///
/// Created at the start of pass one, mutated only by pass two, read-only in
/// pass three. Each record is owned by exactly one processing step at a time;
/// nothing here is shared between concurrent mutators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub candidate: CandidateDocument,
    /// Metadata snapshot from the host OS (empty when unavailable).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Extracted plain text, lazily populated by pass two.
    #[serde(default)]
    pub text: Option<String>,
    /// Classification result; absent until pass two runs.
    #[serde(default)]
    pub classification: Option<Classification>,
    /// Estimated effort hours; `None` means unknown, not zero.
    #[serde(default)]
    pub hours_spent: Option<f64>,
    /// Whether the desired tags were verifiably applied. `None` when tagging
    /// was disabled or unsupported for this origin.
    #[serde(default)]
    pub finder_tagged: Option<bool>,
    /// Set when per-document processing failed; the record still appears in
    /// the report as unclassified/partial.
    #[serde(default)]
    pub failed: bool,
}

impl Artifact {
    pub fn new(candidate: CandidateDocument) -> Self {
        Self {
            candidate,
            metadata: HashMap::new(),
            text: None,
            classification: None,
            hours_spent: None,
            finder_tagged: None,
            failed: false,
        }
    }

    /// Destination bucket label used in progress totals and the report.
    pub fn bucket(&self) -> String {
        self.classification
            .as_ref()
            .filter(|c| !c.is_unclassified())
            .map(|c| c.destination.clone())
            .unwrap_or_else(|| UNCLASSIFIED.to_string())
    }
}
