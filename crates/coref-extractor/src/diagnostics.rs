//! Diagnostics module
//!
//! Classifies catch, filter and purge decisions against gold mention spans
//! and derives precision, recall and F1 per stage. Collection is optional:
//! the pipeline holds an `Option<Diagnostics>` and never reads it back, so
//! enabling it cannot change resolution results.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coref_core::Span;

// ============================================================================
// Keys
// ============================================================================

/// Pipeline stage a decision belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Catch,
    Filter,
    Purge,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catch => "catch",
            Self::Filter => "filter",
            Self::Purge => "purge",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a decision compared with the gold annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    TruePositive,
    FalsePositive,
    FalseNegative,
    TrueNegative,
}

/// A classified mention
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub span: Span,
    pub mention: String,
}

/// Rule name used when no rule made the decision
pub const NO_RULE: &str = "NONE";

// ============================================================================
// Stage Metrics
// ============================================================================

/// Counts for one stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMetrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl StageMetrics {
    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f32 {
        if self.true_positives + self.false_positives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_positives) as f32
        }
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f32 {
        if self.true_positives + self.false_negatives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_negatives) as f32
        }
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f32 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Calculate accuracy ((TP + TN) / total)
    pub fn accuracy(&self) -> f32 {
        let total =
            self.true_positives + self.false_positives + self.false_negatives + self.true_negatives;
        if total == 0 {
            0.0
        } else {
            (self.true_positives + self.true_negatives) as f32 / total as f32
        }
    }

    fn add(&mut self, other: &StageMetrics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.true_negatives += other.true_negatives;
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

type RuleRecords = BTreeMap<Classification, BTreeSet<DiagnosticRecord>>;

/// Per-document diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub generated_at: DateTime<Utc>,

    /// Configured rule names per stage
    pub rules: BTreeMap<Stage, Vec<String>>,

    /// stage -> rule name -> classification -> mentions
    pub stages: BTreeMap<Stage, BTreeMap<String, RuleRecords>>,

    /// Links made by each sieve
    pub sieve_links: BTreeMap<String, usize>,
}

impl Diagnostics {
    /// Create empty diagnostics
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            rules: BTreeMap::new(),
            stages: BTreeMap::new(),
            sieve_links: BTreeMap::new(),
        }
    }

    /// Record the configured rule names of a stage
    pub fn with_rules(mut self, stage: Stage, names: &[String]) -> Self {
        self.rules.insert(stage, names.to_vec());
        self
    }

    /// Record a classified decision
    pub fn record(
        &mut self,
        stage: Stage,
        rule: &str,
        classification: Classification,
        span: Span,
        mention: &str,
    ) {
        self.stages
            .entry(stage)
            .or_default()
            .entry(rule.to_string())
            .or_default()
            .entry(classification)
            .or_default()
            .insert(DiagnosticRecord {
                span,
                mention: mention.to_string(),
            });
    }

    /// Remove every record of a span under a classification, for any rule
    pub fn retract(&mut self, stage: Stage, classification: Classification, span: Span) {
        if let Some(rules) = self.stages.get_mut(&stage) {
            for records in rules.values_mut() {
                if let Some(set) = records.get_mut(&classification) {
                    set.retain(|r| r.span != span);
                }
            }
        }
    }

    /// Check whether a span is recorded under a classification
    pub fn contains(&self, stage: Stage, classification: Classification, span: Span) -> bool {
        self.stages
            .get(&stage)
            .map(|rules| {
                rules.values().any(|records| {
                    records
                        .get(&classification)
                        .is_some_and(|set| set.iter().any(|r| r.span == span))
                })
            })
            .unwrap_or(false)
    }

    /// Records of one rule
    pub fn records(&self, stage: Stage, rule: &str, classification: Classification) -> Vec<&DiagnosticRecord> {
        self.stages
            .get(&stage)
            .and_then(|rules| rules.get(rule))
            .and_then(|records| records.get(&classification))
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// Add links made by a sieve
    pub fn add_sieve_links(&mut self, sieve: &str, links: usize) {
        *self.sieve_links.entry(sieve.to_string()).or_default() += links;
    }

    /// Counts for a stage, over all rules
    pub fn stage_metrics(&self, stage: Stage) -> StageMetrics {
        let mut metrics = StageMetrics::default();
        let Some(rules) = self.stages.get(&stage) else {
            return metrics;
        };
        for records in rules.values() {
            for (classification, set) in records {
                let count = set.len();
                match classification {
                    Classification::TruePositive => metrics.true_positives += count,
                    Classification::FalsePositive => metrics.false_positives += count,
                    Classification::FalseNegative => metrics.false_negatives += count,
                    Classification::TrueNegative => metrics.true_negatives += count,
                }
            }
        }
        metrics
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Aggregate diagnostics for a batch of documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub catch: StageMetrics,
    pub filter: StageMetrics,
    pub purge: StageMetrics,
    pub sieve_links: BTreeMap<String, usize>,
    pub num_documents: usize,
}

impl DiagnosticsSummary {
    /// Add one document
    pub fn add(&mut self, diagnostics: &Diagnostics) {
        self.catch.add(&diagnostics.stage_metrics(Stage::Catch));
        self.filter.add(&diagnostics.stage_metrics(Stage::Filter));
        self.purge.add(&diagnostics.stage_metrics(Stage::Purge));
        for (sieve, links) in &diagnostics.sieve_links {
            *self.sieve_links.entry(sieve.clone()).or_default() += links;
        }
        self.num_documents += 1;
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        let mut report = format!(
            "=== Mention Pipeline Report ===\n\nDocuments evaluated: {}\n\n",
            self.num_documents
        );
        for (title, metrics) in [
            ("Catch", &self.catch),
            ("Filter", &self.filter),
            ("Purge", &self.purge),
        ] {
            report.push_str(&format!(
                "{title}:\n  Precision: {:.1}%\n  Recall:    {:.1}%\n  F1 Score:  {:.1}%\n  TP: {} | FP: {} | FN: {} | TN: {}\n\n",
                metrics.precision() * 100.0,
                metrics.recall() * 100.0,
                metrics.f1_score() * 100.0,
                metrics.true_positives,
                metrics.false_positives,
                metrics.false_negatives,
                metrics.true_negatives,
            ));
        }
        report.push_str("Sieve links:\n");
        for (sieve, links) in &self.sieve_links {
            report.push_str(&format!("  {sieve}: {links}\n"));
        }
        report
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_metrics() {
        let metrics = StageMetrics {
            true_positives: 8,
            false_positives: 2,
            false_negatives: 2,
            true_negatives: 0,
        };
        assert!((metrics.precision() - 0.8).abs() < 0.001);
        assert!((metrics.recall() - 0.8).abs() < 0.001);
        assert!((metrics.f1_score() - 0.8).abs() < 0.001);
        assert_eq!(StageMetrics::default().f1_score(), 0.0);
    }

    #[test]
    fn test_record_and_retract() {
        let mut diagnostics = Diagnostics::new();
        let span = Span::new(0, 1);
        diagnostics.record(Stage::Catch, NO_RULE, Classification::FalseNegative, span, "c1");
        assert!(diagnostics.contains(Stage::Catch, Classification::FalseNegative, span));

        diagnostics.retract(Stage::Catch, Classification::FalseNegative, span);
        diagnostics.record(Stage::Catch, "ConstituentCatcher", Classification::TruePositive, span, "c0");
        assert!(!diagnostics.contains(Stage::Catch, Classification::FalseNegative, span));
        assert_eq!(
            diagnostics
                .records(Stage::Catch, "ConstituentCatcher", Classification::TruePositive)
                .len(),
            1
        );

        let metrics = diagnostics.stage_metrics(Stage::Catch);
        assert_eq!(metrics.true_positives, 1);
        assert_eq!(metrics.false_negatives, 0);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(Stage::Purge, "SingletonPurge", Classification::TruePositive, Span::new(3, 3), "w3");
        diagnostics.add_sieve_links("ESM", 2);
        let json = serde_json::to_string(&diagnostics).unwrap();
        assert!(json.contains("\"purge\""));
        assert!(json.contains("\"true_positive\""));
        assert!(json.contains("\"ESM\":2"));
    }

    #[test]
    fn test_summary_report() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(Stage::Filter, "InterjectionFilter", Classification::TruePositive, Span::new(0, 0), "w0");
        diagnostics.add_sieve_links("PNM", 1);

        let mut summary = DiagnosticsSummary::default();
        summary.add(&diagnostics);
        summary.add(&diagnostics);
        assert_eq!(summary.num_documents, 2);
        assert_eq!(summary.filter.true_positives, 2);
        assert_eq!(summary.sieve_links["PNM"], 2);

        let report = summary.report();
        assert!(report.contains("Documents evaluated: 2"));
        assert!(report.contains("PNM: 2"));
    }
}
