// src/classify/scoring.rs - Weighted feature scoring and classification decision
use serde::{Deserialize, Serialize};

use crate::models::{Classification, FeatureFlags};

/// Decision thresholds for the raw score. Scores at or beyond either bound
/// classify directly; the band in between falls through to the probability
/// comparison and then the structural tie-break.
pub const BUSINESS_SCORE_THRESHOLD: f64 = 0.12;
pub const INDIVIDUAL_SCORE_THRESHOLD: f64 = -0.12;

/// Bonus applied to whichever side has a fired label signal when comparing
/// provider probabilities in the fallback band.
const LABEL_BONUS: f64 = 0.10;

/// The weight table is data, not code: ruleset variants swap the table
/// without touching the decision logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub business_suffix: f64,
    pub business_keyword: f64,
    pub ampersand: f64,
    pub org_probability: f64,
    pub tax_id: f64,
    pub government_pattern: f64,
    pub apartment_pattern: f64,
    pub starts_with_article: f64,
    pub honorific: f64,
    pub first_name_match: f64,
    pub person_probability: f64,
    pub generation_suffix: f64,
    pub two_tokens: f64,
    pub multiple_last_names: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            business_suffix: 0.45,
            business_keyword: 0.30,
            ampersand: 0.15,
            org_probability: 0.20,
            tax_id: 0.10,
            government_pattern: 0.25,
            apartment_pattern: 0.20,
            starts_with_article: 0.10,
            honorific: -0.40,
            first_name_match: -0.35,
            person_probability: -0.25,
            generation_suffix: -0.15,
            two_tokens: -0.10,
            multiple_last_names: -0.05,
        }
    }
}

/// Raw weighted score plus the classification it decided.
#[derive(Debug, Clone, Copy)]
pub struct ScoreOutcome {
    /// Weighted feature sum clamped to [-1, 1]. Positive leans Business.
    pub raw_score: f64,
    pub classification: Classification,
    /// Which level of the decision fallback fired: 0 = threshold,
    /// 1 = probability comparison, 2 = structural tie-break.
    pub decision_level: u8,
}

/// Compute the clamped weighted score and classify. The three-level
/// fallback order is load-bearing: threshold decision, then provider
/// probability comparison with label bonuses, then structural tie-break.
pub fn score(features: &FeatureFlags, weights: &ScoringWeights) -> ScoreOutcome {
    let mut raw = 0.0;
    if features.business_suffix {
        raw += weights.business_suffix;
    }
    if features.business_keyword {
        raw += weights.business_keyword;
    }
    if features.ampersand {
        raw += weights.ampersand;
    }
    raw += weights.org_probability * features.org_probability;
    if features.tax_id_pattern {
        raw += weights.tax_id;
    }
    if features.government_pattern {
        raw += weights.government_pattern;
    }
    if features.apartment_pattern {
        raw += weights.apartment_pattern;
    }
    if features.starts_with_article {
        raw += weights.starts_with_article;
    }
    if features.honorific {
        raw += weights.honorific;
    }
    if features.first_name_match {
        raw += weights.first_name_match;
    }
    raw += weights.person_probability * features.person_probability;
    if features.generation_suffix {
        raw += weights.generation_suffix;
    }
    if features.token_count == 2 {
        raw += weights.two_tokens;
    }
    if features.multiple_last_names {
        raw += weights.multiple_last_names;
    }
    let raw_score = raw.clamp(-1.0, 1.0);

    if raw_score >= BUSINESS_SCORE_THRESHOLD {
        return ScoreOutcome {
            raw_score,
            classification: Classification::Business,
            decision_level: 0,
        };
    }
    if raw_score <= INDIVIDUAL_SCORE_THRESHOLD {
        return ScoreOutcome {
            raw_score,
            classification: Classification::Individual,
            decision_level: 0,
        };
    }

    let org_adjusted = features.org_probability
        + if features.has_business_signal() {
            LABEL_BONUS
        } else {
            0.0
        };
    let person_adjusted = features.person_probability
        + if features.has_person_signal() {
            LABEL_BONUS
        } else {
            0.0
        };
    if org_adjusted != person_adjusted {
        return ScoreOutcome {
            raw_score,
            classification: if org_adjusted > person_adjusted {
                Classification::Business
            } else {
                Classification::Individual
            },
            decision_level: 1,
        };
    }

    let classification = if features.first_name_match
        && features.token_count <= 3
        && !features.has_business_signal()
    {
        Classification::Individual
    } else if features.has_business_signal() {
        Classification::Business
    } else {
        // Ambiguous both ways: default to Individual, the conservative
        // class for compliance review.
        Classification::Individual
    };
    ScoreOutcome {
        raw_score,
        classification,
        decision_level: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business_features() -> FeatureFlags {
        FeatureFlags {
            business_suffix: true,
            business_keyword: true,
            token_count: 4,
            org_probability: 0.9,
            person_probability: 0.05,
            ..Default::default()
        }
    }

    fn person_features() -> FeatureFlags {
        FeatureFlags {
            honorific: true,
            first_name_match: true,
            generation_suffix: true,
            token_count: 4,
            org_probability: 0.1,
            person_probability: 0.9,
            ..Default::default()
        }
    }

    #[test]
    fn test_strong_business_hits_threshold() {
        let outcome = score(&business_features(), &ScoringWeights::default());
        assert_eq!(outcome.classification, Classification::Business);
        assert_eq!(outcome.decision_level, 0);
        assert!(outcome.raw_score >= BUSINESS_SCORE_THRESHOLD);
    }

    #[test]
    fn test_strong_person_hits_threshold() {
        let outcome = score(&person_features(), &ScoringWeights::default());
        assert_eq!(outcome.classification, Classification::Individual);
        assert_eq!(outcome.decision_level, 0);
        assert!(outcome.raw_score <= INDIVIDUAL_SCORE_THRESHOLD);
    }

    #[test]
    fn test_raw_score_clamped() {
        let mut features = business_features();
        features.government_pattern = true;
        features.apartment_pattern = true;
        features.ampersand = true;
        features.tax_id_pattern = true;
        features.starts_with_article = true;
        features.org_probability = 1.0;
        let outcome = score(&features, &ScoringWeights::default());
        assert!(outcome.raw_score <= 1.0);
        assert!((-1.0..=1.0).contains(&outcome.raw_score));
    }

    #[test]
    fn test_probability_fallback_in_dead_band() {
        // No flags at all; the score is driven only by the probability
        // terms, which cancel into the dead band.
        let features = FeatureFlags {
            token_count: 3,
            org_probability: 0.60,
            person_probability: 0.45,
            ..Default::default()
        };
        let outcome = score(&features, &ScoringWeights::default());
        assert_eq!(outcome.decision_level, 1);
        assert_eq!(outcome.classification, Classification::Business);
    }

    #[test]
    fn test_tie_break_individual_on_first_name() {
        let features = FeatureFlags {
            first_name_match: true,
            token_count: 2,
            org_probability: 0.5,
            person_probability: 0.5,
            ..Default::default()
        };
        // person side gets the label bonus, so level 1 decides Individual.
        let outcome = score(&features, &ScoringWeights::default());
        assert_eq!(outcome.classification, Classification::Individual);
    }

    #[test]
    fn test_ambiguous_defaults_to_individual() {
        let features = FeatureFlags {
            token_count: 1,
            org_probability: 0.5,
            person_probability: 0.5,
            ..Default::default()
        };
        let outcome = score(&features, &ScoringWeights::default());
        assert_eq!(outcome.decision_level, 2);
        assert_eq!(outcome.classification, Classification::Individual);
    }

    #[test]
    fn test_determinism() {
        let features = business_features();
        let weights = ScoringWeights::default();
        let a = score(&features, &weights);
        let b = score(&features, &weights);
        assert_eq!(a.classification, b.classification);
        assert_eq!(a.raw_score, b.raw_score);
    }
}
