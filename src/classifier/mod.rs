//! Rule-based artifact classification and scoring.
//!
//! `classify` applies the configured rule set to extracted text, the
//! filename, and the metadata snapshot, producing a deterministic
//! [`Classification`]: the per-category subcategory matches, a primary
//! category, a capped score, and a human-readable rationale. A document no
//! rule matches still gets an explicit "Unclassified" result rather than a
//! silently dropped `None`.

mod rules;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

pub use rules::{
    default_legacy_rules, CategoryRuleConfig, LegacyRuleConfig, Pattern, RulesConfig,
    ScoringConfig, SubcategoryRuleConfig,
};

/// Primary category assigned when no rule matches.
pub const UNCLASSIFIED: &str = "Unclassified";

/// Extracted text is truncated to this prefix before matching, bounding the
/// cost of classifying huge documents.
const TEXT_PREFIX_CHARS: usize = 500;

/// Result of classifying one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Matched category → matched subcategory names.
    pub matched: HashMap<String, Vec<String>>,
    /// Highest-weighted matched category, or [`UNCLASSIFIED`].
    pub primary: String,
    /// Portfolio destination label for the primary category.
    pub destination: String,
    /// Weighted hit score plus bonuses, capped at the configured per-file
    /// maximum. Always within `[0, cap_per_file]`.
    pub score: f64,
    /// Summary of which subcategories matched per category.
    pub rationale: String,
}

impl Classification {
    pub fn unclassified() -> Self {
        Self {
            matched: HashMap::new(),
            primary: UNCLASSIFIED.to_string(),
            destination: UNCLASSIFIED.to_string(),
            score: 0.0,
            rationale: String::new(),
        }
    }

    pub fn is_unclassified(&self) -> bool {
        self.primary == UNCLASSIFIED
    }

    /// Render the category:subcategory breakdown as a stable string, sorted
    /// by category name so output never depends on map iteration order.
    pub fn breakdown(&self) -> String {
        let mut entries: Vec<_> = self.matched.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
            .iter()
            .map(|(cat, subs)| format!("{}: {}", cat, subs.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

struct LegacyRule {
    /// Each keyword, split into lowercased words. A keyword matches when
    /// every one of its words is a prefix of some token; the rule matches
    /// when all of its keywords match.
    keyword_words: Vec<Vec<String>>,
    category: String,
    subcategory: String,
    destination: String,
    rationale: String,
}

struct SubcategoryRule {
    name: String,
    patterns: Vec<Pattern>,
}

struct CategoryRule {
    name: String,
    weight: f64,
    destination: Option<String>,
    subcategories: Vec<SubcategoryRule>,
}

/// Compiled rule set. Pure data, no I/O; safe to share read-only across a
/// future parallel pass.
pub struct RuleSet {
    legacy: Vec<LegacyRule>,
    categories: Vec<CategoryRule>,
    scoring: ScoringConfig,
}

impl RuleSet {
    /// Compile the configured rules. Legacy rules default to the built-in
    /// dossier table when the config declares none. Compilation cannot fail:
    /// malformed patterns degrade to literal matching.
    pub fn from_config(rules: &RulesConfig, scoring: &ScoringConfig) -> Self {
        let legacy_configs = if rules.legacy.is_empty() {
            default_legacy_rules()
        } else {
            rules.legacy.clone()
        };

        let legacy = legacy_configs
            .into_iter()
            .map(|r| LegacyRule {
                keyword_words: r
                    .keywords
                    .iter()
                    .map(|k| {
                        k.to_lowercase()
                            .split_whitespace()
                            .map(|w| w.to_string())
                            .collect()
                    })
                    .collect(),
                category: r.category,
                subcategory: r.subcategory,
                destination: r.destination,
                rationale: r.rationale,
            })
            .collect();

        let categories = rules
            .categories
            .iter()
            .map(|c| CategoryRule {
                name: c.name.clone(),
                weight: c.weight,
                destination: c.destination.clone(),
                subcategories: c
                    .subcategories
                    .iter()
                    .map(|s| SubcategoryRule {
                        name: s.name.clone(),
                        patterns: s.patterns.iter().map(|p| Pattern::compile(p)).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            legacy,
            categories,
            scoring: scoring.clone(),
        }
    }

    /// Per-document score cap.
    pub fn cap_per_file(&self) -> f64 {
        self.scoring.cap_per_file
    }

    /// Configured weight for a category (1.0 when unconfigured).
    fn weight_of(&self, category: &str) -> f64 {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.weight)
            .unwrap_or(1.0)
    }

    /// Classify one document from its extracted text, filename and metadata
    /// snapshot. Deterministic: the same inputs always yield the same result.
    pub fn classify(
        &self,
        text: Option<&str>,
        file_name: &str,
        metadata: &HashMap<String, String>,
    ) -> Classification {
        let text_prefix: String = text
            .unwrap_or("")
            .chars()
            .take(TEXT_PREFIX_CHARS)
            .collect();

        // Token set for legacy prefix matching: filename + metadata values
        // + bounded text prefix, split on whitespace and common separators.
        let mut tokens: HashSet<String> = HashSet::new();
        tokens.extend(tokenize(file_name));
        // Sorted for determinism; the token set itself is order-free but we
        // keep extension predictable.
        let mut meta_values: Vec<&String> = metadata.values().collect();
        meta_values.sort();
        for value in &meta_values {
            tokens.extend(tokenize(value));
        }
        tokens.extend(tokenize(&text_prefix));

        // Combined lowercase haystack for pattern and bonus matching.
        let mut haystack = String::new();
        haystack.push_str(&text_prefix);
        haystack.push(' ');
        haystack.push_str(file_name);
        for value in &meta_values {
            haystack.push(' ');
            haystack.push_str(value);
        }
        let haystack = haystack.to_lowercase();

        let legacy_hit = self.legacy.iter().find(|rule| {
            rule.keyword_words.iter().all(|words| {
                words
                    .iter()
                    .all(|word| tokens.iter().any(|t| t.starts_with(word.as_str())))
            })
        });

        // Accumulate matches in encounter order: the legacy category first
        // (the legacy table is configured ahead of the pattern categories),
        // then the pattern categories in declaration order.
        let mut order: Vec<String> = Vec::new();
        let mut matched: HashMap<String, Vec<String>> = HashMap::new();

        if let Some(rule) = legacy_hit {
            order.push(rule.category.clone());
            matched.insert(rule.category.clone(), vec![rule.subcategory.clone()]);
        }

        for category in &self.categories {
            let subs: Vec<String> = category
                .subcategories
                .iter()
                .filter(|s| s.patterns.iter().any(|p| p.matches(&haystack)))
                .map(|s| s.name.clone())
                .collect();
            if subs.is_empty() {
                continue;
            }
            let entry = matched.entry(category.name.clone()).or_insert_with(|| {
                order.push(category.name.clone());
                Vec::new()
            });
            for sub in subs {
                if !entry.contains(&sub) {
                    entry.push(sub);
                }
            }
        }

        if matched.is_empty() {
            return Classification::unclassified();
        }

        // Primary category: maximum weight × match count, ties resolved by
        // encounter order.
        let mut primary = order[0].clone();
        let mut best = f64::MIN;
        let mut weighted_sum = 0.0;
        for name in &order {
            let count = matched[name].len() as f64;
            let weighted = self.weight_of(name) * count;
            weighted_sum += weighted;
            if weighted > best {
                best = weighted;
                primary = name.clone();
            }
        }

        // Bonus keywords match against text + filename only.
        let bonus_haystack = format!("{} {}", text_prefix, file_name).to_lowercase();
        let bonus: f64 = self
            .scoring
            .bonus_keywords
            .iter()
            .filter(|(kw, _)| bonus_haystack.contains(kw.to_lowercase().as_str()))
            .map(|(_, points)| points)
            .sum();

        let raw_score = weighted_sum * self.scoring.per_hit_points + bonus;
        let score = raw_score.clamp(0.0, self.scoring.cap_per_file);

        let destination = self.destination_for(&primary, legacy_hit);
        let rationale = build_rationale(&order, &matched, legacy_hit);

        Classification {
            matched,
            primary,
            destination,
            score,
            rationale,
        }
    }

    fn destination_for(&self, primary: &str, legacy_hit: Option<&LegacyRule>) -> String {
        if let Some(rule) = legacy_hit {
            if rule.category == primary {
                return rule.destination.clone();
            }
        }
        self.categories
            .iter()
            .find(|c| c.name == primary)
            .and_then(|c| c.destination.clone())
            .unwrap_or_else(|| format!("Primary PDF → {} Evidence", primary))
    }
}

fn build_rationale(
    order: &[String],
    matched: &HashMap<String, Vec<String>>,
    legacy_hit: Option<&LegacyRule>,
) -> String {
    let summary = order
        .iter()
        .map(|cat| format!("{}: {}", cat, matched[cat].join(", ")))
        .collect::<Vec<_>>()
        .join("; ");
    match legacy_hit {
        Some(rule) => format!("{} Matched {}", rule.rationale, summary),
        None => format!("Matched {}", summary),
    }
}

/// Lowercase and split on whitespace after mapping `_` and `-` to spaces.
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}
