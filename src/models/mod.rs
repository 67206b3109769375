// src/models/mod.rs - Core data model for payee classification
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The two possible payee classes. Every result carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Business,
    Individual,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Business => "Business",
            Classification::Individual => "Individual",
        }
    }
}

/// Which stage of the escalation cascade produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingTier {
    Excluded,
    RuleBased,
    FuzzyMatch,
    Heuristic,
    AiAssisted,
}

impl ProcessingTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingTier::Excluded => "excluded",
            ProcessingTier::RuleBased => "rule_based",
            ProcessingTier::FuzzyMatch => "fuzzy_match",
            ProcessingTier::Heuristic => "heuristic",
            ProcessingTier::AiAssisted => "ai_assisted",
        }
    }
}

/// Canonical form of a raw payee name plus its token list.
/// Derived on demand, never cached across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub text: String,
    pub tokens: Vec<String>,
}

impl NormalizedName {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Fixed-shape signals derived from a normalized name, used as scoring input.
/// The org/person probabilities come from the injected entity-signal provider
/// and are treated opaquely by the scoring engine.
#[derive(Debug, Clone, Default)]
pub struct FeatureFlags {
    pub business_suffix: bool,
    pub honorific: bool,
    pub generation_suffix: bool,
    pub ampersand: bool,
    pub business_keyword: bool,
    pub first_name_match: bool,
    pub tax_id_pattern: bool,
    pub token_count: usize,
    pub government_pattern: bool,
    pub apartment_pattern: bool,
    pub starts_with_article: bool,
    pub multiple_last_names: bool,
    pub org_probability: f64,
    pub person_probability: f64,
}

impl FeatureFlags {
    /// True when any business-side label signal fired.
    pub fn has_business_signal(&self) -> bool {
        self.business_suffix || self.business_keyword || self.government_pattern
    }

    /// True when any person-side label signal fired.
    pub fn has_person_signal(&self) -> bool {
        self.first_name_match || self.honorific || self.generation_suffix
    }
}

/// Final classification output for a single payee name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub classification: Classification,
    /// Calibrated confidence in [0, 100], reflecting the deciding tier.
    pub confidence: u8,
    pub reasoning: String,
    pub tier: ProcessingTier,
    /// Ordered names of the rules/signals that fired.
    pub matching_rules: Vec<String>,
}

impl ClassificationResult {
    /// Minimum-confidence default for empty or invalid input. Handled
    /// locally; never surfaced as an error.
    pub fn invalid_input() -> Self {
        Self {
            classification: Classification::Individual,
            confidence: 0,
            reasoning: "Invalid or empty payee name".to_string(),
            tier: ProcessingTier::RuleBased,
            matching_rules: vec!["invalid_input".to_string()],
        }
    }
}

/// The four per-metric similarity scores plus their fixed convex blend,
/// each in [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimilarityScores {
    pub levenshtein: f64,
    pub jaro_winkler: f64,
    pub dice: f64,
    pub token_sort: f64,
    pub combined: f64,
}

/// One unit of unique work surviving deduplication. The original index is
/// preserved end-to-end so batch output can be realigned with input order.
#[derive(Debug, Clone)]
pub struct ProcessingQueueItem {
    pub name: String,
    pub original_index: usize,
    /// Opaque caller-supplied row record, echoed unmodified on the result.
    pub row: Option<serde_json::Value>,
}

/// How a duplicate relates to the unique item it defers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKind {
    Exact,
    Fuzzy,
}

/// Record that input position `original_index` duplicates the unique item at
/// `canonical_index` and should reuse its result.
#[derive(Debug, Clone)]
pub struct DuplicateRef {
    pub canonical_index: usize,
    pub kind: DuplicateKind,
    /// Combined similarity that triggered the fuzzy match; 100 for exact.
    pub similarity: f64,
}

/// Per-item batch output, aligned to the original input position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub original_index: usize,
    pub name: String,
    pub result: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<serde_json::Value>,
    /// Input index of the first occurrence this item duplicated, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<usize>,
}

/// Summary statistics for one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    pub run_id: String,
    pub started_at: NaiveDateTime,
    pub total: usize,
    pub unique_processed: usize,
    pub exact_duplicates: usize,
    pub fuzzy_duplicates: usize,
    pub tier_counts: HashMap<String, usize>,
    pub ai_batches: usize,
    pub retried_items: usize,
    pub elapsed_ms: u64,
}

/// Ordered results for a whole batch. `results.len()` always equals the
/// input length and the indices form a gap-free permutation of 0..n-1.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub results: Vec<BatchItemResult>,
    pub stats: BatchStats,
}
