//! Rule definitions for document classification.
//!
//! Two rule forms coexist and are evaluated as distinct modes:
//!
//! - **Legacy keyword rules** require *all* listed keywords to match via a
//!   token-prefix test. They carry a portfolio destination and a rationale.
//! - **Pattern rules** group subcategories under weighted categories; a
//!   subcategory matches when *any* of its patterns matches.
//!
//! The AND-vs-ANY asymmetry is deliberate and load-bearing: merging the two
//! modes would silently change which documents classify.

use std::collections::HashMap;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// A legacy AND-of-keywords rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRuleConfig {
    /// All keywords must match for the rule to fire. Multi-word keywords
    /// match when every word prefix-matches some token.
    pub keywords: Vec<String>,
    pub category: String,
    pub subcategory: String,
    /// Portfolio destination label, e.g. "Primary PDF → Teaching Evidence".
    pub destination: String,
    pub rationale: String,
}

impl LegacyRuleConfig {
    fn new(
        keywords: &[&str],
        category: &str,
        subcategory: &str,
        destination: &str,
        rationale: &str,
    ) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            destination: destination.to_string(),
            rationale: rationale.to_string(),
        }
    }
}

/// A single subcategory with its ANY-of patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubcategoryRuleConfig {
    pub name: String,
    /// Substring or regex patterns, matched case-insensitively. Invalid
    /// regexes degrade to literal substring matching.
    pub patterns: Vec<String>,
}

/// A weighted category grouping pattern subcategories.
///
/// Categories are declared as a sequence so declaration order is preserved
/// for the primary-category tie-break.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRuleConfig {
    pub name: String,
    /// Per-category score multiplier.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Destination label override for this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryRuleConfig>,
}

fn default_weight() -> f64 {
    1.0
}

/// Rule set configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Legacy keyword rules. When empty, the built-in dossier rule table
    /// from [`default_legacy_rules`] is used instead.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legacy: Vec<LegacyRuleConfig>,
    /// Weighted pattern categories, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryRuleConfig>,
}

impl RulesConfig {
    pub fn is_default(&self) -> bool {
        self.legacy.is_empty() && self.categories.is_empty()
    }
}

/// Scoring weights, bonuses and the per-document cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points contributed per weighted subcategory hit.
    #[serde(default = "default_per_hit_points")]
    pub per_hit_points: f64,
    /// Upper bound on any single document's score.
    #[serde(default = "default_cap_per_file")]
    pub cap_per_file: f64,
    /// Extra points when a keyword appears anywhere in text + filename.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub bonus_keywords: HashMap<String, f64>,
}

fn default_per_hit_points() -> f64 {
    1.0
}

fn default_cap_per_file() -> f64 {
    10.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            per_hit_points: default_per_hit_points(),
            cap_per_file: default_cap_per_file(),
            bonus_keywords: HashMap::new(),
        }
    }
}

impl ScoringConfig {
    pub fn is_default(&self) -> bool {
        self.per_hit_points == default_per_hit_points()
            && self.cap_per_file == default_cap_per_file()
            && self.bonus_keywords.is_empty()
    }
}

/// A compiled match pattern. Malformed regexes must not abort the rule set,
/// so compilation degrades to literal substring matching instead of failing.
#[derive(Debug, Clone)]
pub enum Pattern {
    Regex(regex::Regex),
    Literal(String),
}

impl Pattern {
    pub fn compile(raw: &str) -> Self {
        match RegexBuilder::new(raw).case_insensitive(true).build() {
            Ok(re) => Pattern::Regex(re),
            Err(e) => {
                tracing::debug!("pattern {:?} is not a valid regex ({}), matching literally", raw, e);
                Pattern::Literal(raw.to_lowercase())
            }
        }
    }

    /// Test against an already-lowercased haystack.
    pub fn matches(&self, haystack: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(haystack),
            Pattern::Literal(lit) => haystack.contains(lit.as_str()),
        }
    }
}

/// The built-in dossier rule table, used when the configuration provides no
/// legacy rules of its own.
pub fn default_legacy_rules() -> Vec<LegacyRuleConfig> {
    vec![
        LegacyRuleConfig::new(
            &["concert program", "ensemble"],
            "Teaching",
            "Ensemble Leadership",
            "Primary PDF → Teaching Evidence",
            "Ensemble programs demonstrate instructional leadership.",
        ),
        LegacyRuleConfig::new(
            &["student assessment", "quiz", "evaluation"],
            "Teaching",
            "Course Assessment",
            "Primary PDF → Teaching Evidence",
            "Student feedback shows teaching effectiveness.",
        ),
        LegacyRuleConfig::new(
            &["repertoire feedback", "pedagogy"],
            "Teaching",
            "Course Material",
            "Primary PDF → Teaching Evidence",
            "Pedagogical material documents learning outcomes.",
        ),
        LegacyRuleConfig::new(
            &["member info", "roster"],
            "Service",
            "Recruiting (admin evidence)",
            "Primary PDF → Service Evidence",
            "Recruitment management is classified as service.",
        ),
        LegacyRuleConfig::new(
            &["recruiting email", "prospect"],
            "Service",
            "Recruiting (outreach)",
            "Primary PDF → Service Evidence",
            "Outreach recruiting is a service activity.",
        ),
        LegacyRuleConfig::new(
            &["vendor order", "invoice", "receipt"],
            "Service",
            "Logistics / Ops",
            "Appendices",
            "Operational logistics go to appendices.",
        ),
        LegacyRuleConfig::new(
            &["leadership application", "mentorship"],
            "Teaching",
            "Mentorship / Leadership Dev.",
            "Primary PDF → Teaching Evidence",
            "Leadership development counts as teaching.",
        ),
        LegacyRuleConfig::new(
            &["drill design", "musx", "sib"],
            "Scholarly / Creative",
            "Creative Output",
            "Primary PDF → Scholarship Evidence",
            "Design files are creative scholarship.",
        ),
        LegacyRuleConfig::new(
            &["composition", "arrangement"],
            "Scholarly / Creative",
            "Creative Output",
            "Primary PDF → Scholarship Evidence",
            "Compositions qualify as scholarship.",
        ),
        LegacyRuleConfig::new(
            &["literature review", "bib"],
            "Scholarly / Creative",
            "Research Prep",
            "Primary PDF → Scholarship Evidence",
            "Lit reviews prepare scholarship.",
        ),
        LegacyRuleConfig::new(
            &["recording", "publicity"],
            "Scholarly / Creative",
            "Creative Output",
            "Primary PDF → Scholarship Evidence",
            "Recordings promote creative work.",
        ),
        LegacyRuleConfig::new(
            &["community performance", "pep band", "game"],
            "Service",
            "University Visibility",
            "Primary PDF → Service Evidence",
            "Campus performances expand visibility.",
        ),
        LegacyRuleConfig::new(
            &["clinic", "adjudicat"],
            "Service",
            "Professional Engagement",
            "Primary PDF → Service Evidence",
            "Clinics and adjudication are service.",
        ),
        LegacyRuleConfig::new(
            &["advising load", "advisee"],
            "Advising",
            "Formal Advising",
            "Primary PDF → Advising Summary",
            "Advising reports document workload.",
        ),
        LegacyRuleConfig::new(
            &["orientation", "grad plan"],
            "Advising",
            "Advising Artifacts",
            "Primary PDF → Advising Evidence",
            "Advising materials support advising.",
        ),
        LegacyRuleConfig::new(
            &["annual evaluation"],
            "Form",
            "Annual Eval",
            "SummaryTable (in Primary PDF)",
            "Annual evaluations are required forms.",
        ),
        LegacyRuleConfig::new(
            &["notice of intent", "cover sheet"],
            "Form",
            "Cover Sheet",
            "Form (separate PDF)",
            "Cover sheets belong in the form section.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_regex_degrades_to_literal() {
        let p = Pattern::compile("[unclosed");
        assert!(matches!(p, Pattern::Literal(_)));
        assert!(p.matches("an [unclosed bracket"));
        assert!(!p.matches("nothing here"));
    }

    #[test]
    fn valid_regex_is_case_insensitive() {
        let p = Pattern::compile("syllabus|course outline");
        assert!(matches!(p, Pattern::Regex(_)));
        assert!(p.matches("mus 201 syllabus"));
    }

    #[test]
    fn default_rule_table_is_complete() {
        let rules = default_legacy_rules();
        assert_eq!(rules.len(), 17);
        assert!(rules.iter().any(|r| r.subcategory == "Ensemble Leadership"));
        assert!(rules.iter().all(|r| !r.keywords.is_empty()));
    }
}
